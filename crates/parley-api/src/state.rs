use std::sync::Arc;

use parley_chat::ChatOrchestrator;
use parley_llm::ProviderRegistry;
use parley_persist::ConversationStore;

use crate::config::Config;

/// Shared application state passed to all handlers
/// 
/// The provider registry is built once at startup and never changes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ConversationStore>,
    pub registry: Arc<ProviderRegistry>,
    pub chat: Arc<ChatOrchestrator>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ConversationStore>,
        registry: ProviderRegistry,
    ) -> Self {
        let registry = Arc::new(registry);
        let chat = ChatOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            config.chat.clone(),
        );
        
        Self {
            config: Arc::new(config),
            store,
            registry,
            chat: Arc::new(chat),
        }
    }
}
