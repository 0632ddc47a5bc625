use parley_persist::PersistError;
use parley_types::ValidationError;
use thiserror::Error;

/// Failures reported before a chat stream is opened
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    
    #[error("Provider {0} not available")]
    ProviderUnavailable(String),
    
    #[error("Session {0} already has a response in progress")]
    SessionBusy(String),
    
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    
    #[error(transparent)]
    Persist(PersistError),
}

impl From<PersistError> for ChatError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::SessionNotFound(id) => Self::SessionNotFound(id),
            PersistError::Validation(e) => Self::Validation(e),
            other => Self::Persist(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
