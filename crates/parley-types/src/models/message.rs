use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{limit_text, require_text, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

/// One persisted turn; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: Option<u32>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// History entry handed to a provider
    pub fn to_llm(&self) -> parley_llm::Message {
        match self.role {
            MessageRole::User => parley_llm::Message::human(self.content.as_str()),
            MessageRole::Assistant => parley_llm::Message::ai(self.content.as_str()),
            MessageRole::System => parley_llm::Message::system(self.content.as_str()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(self.role, &self.content, &self.provider, &self.model)
    }
}

fn validate_fields(
    role: MessageRole,
    content: &str,
    provider: &str,
    model: &str,
) -> Result<(), ValidationError> {
    if role == MessageRole::User {
        require_text("content", content, usize::MAX)?;
    }
    require_text("provider", provider, 50)?;
    limit_text("model", model, 100)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub tokens_used: Option<u32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl NewMessage {
    pub fn user(
        session_id: impl Into<String>,
        content: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            role: MessageRole::User,
            content: content.into(),
            provider: provider.into(),
            model: model.into(),
            tokens_used: None,
            metadata: None,
        }
    }

    pub fn assistant(
        session_id: impl Into<String>,
        content: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        tokens_used: u32,
    ) -> Self {
        Self {
            role: MessageRole::Assistant,
            tokens_used: Some(tokens_used),
            ..Self::user(session_id, content, provider, model)
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(self.role, &self.content, &self.provider, &self.model)
    }

    pub fn into_message(self, now: DateTime<Utc>) -> Message {
        Message {
            id: super::new_id(),
            session_id: self.session_id,
            role: self.role,
            content: self.content,
            provider: self.provider,
            model: self.model,
            tokens_used: self.tokens_used,
            metadata: self.metadata,
            created_at: now,
        }
    }
}
