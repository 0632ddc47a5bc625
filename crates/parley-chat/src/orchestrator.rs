use std::sync::Arc;

use futures::StreamExt;
use parley_llm::{stream_completion, ChatClient, ChatOptions, ChatRequest, CompletionEvent, ProviderRegistry};
use parley_persist::ConversationStore;
use parley_types::{derive_title, ChatEvent, Message, NewMessage, SessionUpdate};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::locks::{SessionGuard, SessionLocks};
use crate::phase::ChatPhase;

const SAVE_FAILED: &str = "Failed to save response";

/// One user turn to send
#[derive(Debug, Clone)]
pub struct SendMessage {
    pub session_id: String,
    pub content: String,
    pub provider: String,
    pub model: String,
}

/// A started send: the persisted user turn plus the live event stream.
///
/// `events` yields the echoed user `message` first and ends after exactly
/// one `done` or `error`.
pub struct ChatRun {
    pub user_message: Message,
    pub events: mpsc::Receiver<ChatEvent>,
    /// Resolves with the terminal phase once generation has finished
    pub task: JoinHandle<ChatPhase>,
}

pub struct ChatOrchestrator {
    store: Arc<dyn ConversationStore>,
    registry: Arc<ProviderRegistry>,
    config: ChatConfig,
    locks: SessionLocks,
}

impl ChatOrchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        registry: Arc<ProviderRegistry>,
        config: ChatConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
            locks: SessionLocks::new(),
        }
    }
    
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }
    
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
    
    /// Validate the request, persist the user turn and spawn generation.
    ///
    /// Errors returned here happen before any event is produced. Missing
    /// sessions and providers leave no trace in the store.
    pub async fn start(&self, request: SendMessage) -> Result<ChatRun> {
        let session_id = request.session_id.clone();
        log_phase(&session_id, ChatPhase::Received);
        
        let session = self
            .store
            .get_session(&session_id)
            .await?
            .ok_or_else(|| ChatError::SessionNotFound(session_id.clone()))?;
        
        let client = self
            .registry
            .get(&request.provider)
            .ok_or_else(|| ChatError::ProviderUnavailable(request.provider.clone()))?;
        
        let guard = if self.config.exclusive_sessions {
            let guard = self
                .locks
                .try_acquire(&session_id)
                .ok_or_else(|| ChatError::SessionBusy(session_id.clone()))?;
            Some(guard)
        } else {
            None
        };
        
        let new_message = NewMessage::user(
            &session.id,
            request.content,
            &request.provider,
            &request.model,
        );
        new_message.validate()?;
        
        let prior = self.store.get_session_messages(&session.id).await?;
        let user_message = self.store.create_message(new_message).await?;
        log_phase(&session_id, ChatPhase::UserPersisted);
        
        let mut history: Vec<parley_llm::Message> = prior.iter().map(Message::to_llm).collect();
        history.push(user_message.to_llm());
        
        let job = Generation {
            store: Arc::clone(&self.store),
            client,
            session_id,
            provider: request.provider,
            model: request.model,
            first_exchange: prior.is_empty(),
            user_message: user_message.clone(),
            history,
            options: ChatOptions {
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            },
            _guard: guard,
        };
        
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let relay = Relay::new(tx, self.config.continue_on_disconnect);
        let task = tokio::spawn(job.run(relay));
        
        Ok(ChatRun {
            user_message,
            events: rx,
            task,
        })
    }
}

fn log_phase(session_id: &str, phase: ChatPhase) {
    tracing::debug!(session_id = %session_id, phase = %phase, "Chat phase");
}

/// Event sink that tracks whether anyone is still listening
struct Relay {
    tx: mpsc::Sender<ChatEvent>,
    connected: bool,
    continue_on_disconnect: bool,
}

impl Relay {
    fn new(tx: mpsc::Sender<ChatEvent>, continue_on_disconnect: bool) -> Self {
        Self {
            tx,
            connected: true,
            continue_on_disconnect,
        }
    }
    
    /// Deliver an event; `false` means generation should stop
    async fn send(&mut self, event: ChatEvent) -> bool {
        if self.connected && self.tx.send(event).await.is_err() {
            self.connected = false;
            tracing::info!(
                continue_on_disconnect = self.continue_on_disconnect,
                "Client disconnected during chat stream"
            );
        }
        self.connected || self.continue_on_disconnect
    }
}

/// Everything the spawned task owns for one send
struct Generation {
    store: Arc<dyn ConversationStore>,
    client: Arc<dyn ChatClient>,
    session_id: String,
    provider: String,
    model: String,
    first_exchange: bool,
    user_message: Message,
    history: Vec<parley_llm::Message>,
    options: ChatOptions,
    /// Held until the task ends when sessions are exclusive
    _guard: Option<SessionGuard>,
}

impl Generation {
    async fn run(self, mut relay: Relay) -> ChatPhase {
        let phase = self.generate(&mut relay).await;
        log_phase(&self.session_id, phase);
        phase
    }
    
    async fn generate(&self, relay: &mut Relay) -> ChatPhase {
        if !relay.send(ChatEvent::message(self.user_message.clone())).await {
            return ChatPhase::Abandoned;
        }
        
        log_phase(&self.session_id, ChatPhase::Generating);
        let request = ChatRequest::new(&self.model, self.history.clone())
            .with_options(self.options.clone());
        
        let mut stream = match stream_completion(self.client.as_ref(), request).await {
            Ok(stream) => stream,
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::warn!(session_id = %self.session_id, provider = %self.provider, error = %message, "Provider request failed");
                relay.send(ChatEvent::error(message)).await;
                return ChatPhase::Failed;
            }
        };
        
        let mut text = String::new();
        while let Some(event) = stream.next().await {
            match event {
                CompletionEvent::Token { content } => {
                    text.push_str(&content);
                    if !relay.send(ChatEvent::token(content)).await {
                        return ChatPhase::Abandoned;
                    }
                }
                CompletionEvent::Done { total_tokens } => {
                    return self.complete(relay, text, total_tokens).await;
                }
                CompletionEvent::Error { message } => {
                    tracing::warn!(session_id = %self.session_id, provider = %self.provider, error = %message, "Provider stream failed");
                    relay.send(ChatEvent::error(message)).await;
                    return ChatPhase::Failed;
                }
            }
        }
        
        relay.send(ChatEvent::error("Provider stream ended unexpectedly")).await;
        ChatPhase::Failed
    }
    
    async fn complete(&self, relay: &mut Relay, text: String, total_tokens: u32) -> ChatPhase {
        log_phase(&self.session_id, ChatPhase::Completing);
        
        let assistant = NewMessage::assistant(
            &self.session_id,
            text,
            &self.provider,
            &self.model,
            total_tokens,
        );
        let assistant = match self.store.create_message(assistant).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(session_id = %self.session_id, error = %e, "Failed to persist assistant message");
                relay.send(ChatEvent::error(SAVE_FAILED)).await;
                return ChatPhase::Failed;
            }
        };
        
        if self.first_exchange {
            let title = derive_title(&self.user_message.content);
            if let Err(e) = self
                .store
                .update_session(&self.session_id, SessionUpdate::title(title))
                .await
            {
                tracing::warn!(session_id = %self.session_id, error = %e, "Failed to update session title");
            }
        }
        
        tracing::info!(
            session_id = %self.session_id,
            provider = %self.provider,
            model = %self.model,
            tokens = total_tokens,
            "Assistant response saved"
        );
        
        relay.send(ChatEvent::message(assistant)).await;
        relay.send(ChatEvent::Done).await;
        ChatPhase::PersistedOk
    }
}
