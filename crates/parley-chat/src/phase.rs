use std::fmt;

/// Lifecycle of one send, from request to terminal event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Received,
    UserPersisted,
    Generating,
    Completing,
    PersistedOk,
    Failed,
    /// Client went away and generation was stopped
    Abandoned,
}

impl ChatPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::UserPersisted => "user_persisted",
            Self::Generating => "generating",
            Self::Completing => "completing",
            Self::PersistedOk => "persisted_ok",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        }
    }
    
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PersistedOk | Self::Failed | Self::Abandoned)
    }
}

impl fmt::Display for ChatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
