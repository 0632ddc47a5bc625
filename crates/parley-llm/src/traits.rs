use anyhow::Result;
use async_trait::async_trait;

use crate::streaming::EventStream;
use crate::types::Message;

/// Capability shared by every provider: stream a chat completion.
///
/// Implementations map the provider-agnostic history into the vendor's wire
/// shape and return a raw event stream. Use [`crate::stream_completion`] to
/// get the normalized stream with a guaranteed terminal event.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Registry key, e.g. `openai`
    fn provider(&self) -> &str;
    
    /// Human readable name
    fn display_name(&self) -> &str;
    
    /// Model identifiers this provider accepts
    fn models(&self) -> Vec<String>;
    
    /// Streaming chat completion
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }
    
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
    
    /// Split off system entries, returning (joined instructions, remaining turns).
    /// Used by vendors that take a separate instruction parameter.
    pub fn split_system(&self) -> (Option<String>, Vec<&Message>) {
        let instructions: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.is_system())
            .map(|m| m.content())
            .collect();
        let turns = self.messages.iter().filter(|m| !m.is_system()).collect();
        
        let system = if instructions.is_empty() {
            None
        } else {
            Some(instructions.join("\n\n"))
        };
        (system, turns)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }
    
    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
    
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}
