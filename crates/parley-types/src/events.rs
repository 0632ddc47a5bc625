use serde::{Deserialize, Serialize};

use crate::models::Message;

/// Event carried on a chat response stream.
///
/// A stream holds any number of `message`/`token` events and ends with
/// exactly one `error` or `done`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Full persisted record (echoed user turn or final assistant turn)
    Message {
        message: Message,
    },
    
    /// Incremental assistant text
    Token {
        content: String,
    },
    
    /// Human readable failure; ends the stream
    Error {
        error: String,
    },
    
    /// Successful end of stream
    Done,
}

impl ChatEvent {
    pub fn message(message: Message) -> Self {
        Self::Message { message }
    }
    
    pub fn token(content: impl Into<String>) -> Self {
        Self::Token {
            content: content.into(),
        }
    }
    
    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }
    
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Done)
    }
    
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::Token { .. } => "token",
            Self::Error { .. } => "error",
            Self::Done => "done",
        }
    }
}
