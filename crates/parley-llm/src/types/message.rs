use serde::{Deserialize, Serialize};

/// Provider-agnostic conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System prompt (instructions)
    System {
        content: String,
    },
    
    /// User/Human message
    #[serde(rename = "user")]
    Human {
        content: String,
    },
    
    /// Assistant/AI message
    #[serde(rename = "assistant")]
    AI {
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }
    
    pub fn human(content: impl Into<String>) -> Self {
        Self::Human {
            content: content.into(),
        }
    }
    
    pub fn ai(content: impl Into<String>) -> Self {
        Self::AI {
            content: content.into(),
        }
    }
    
    /// Build a message from a wire role name (`system`, `user`, `assistant`)
    pub fn from_role(role: &str, content: impl Into<String>) -> Option<Self> {
        match role {
            "system" => Some(Self::system(content)),
            "user" => Some(Self::human(content)),
            "assistant" => Some(Self::ai(content)),
            _ => None,
        }
    }
    
    /// Get role as string
    pub fn role(&self) -> &str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "user",
            Self::AI { .. } => "assistant",
        }
    }
    
    pub fn content(&self) -> &str {
        match self {
            Self::System { content } | Self::Human { content } | Self::AI { content } => content,
        }
    }
    
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System { .. })
    }
}
