use parley_types::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
    
    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),
    
    #[cfg(feature = "mongodb")]
    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),
    
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    
    #[error("Message not found: {0}")]
    MessageNotFound(String),
    
    #[error("Message already exists: {0}")]
    DuplicateMessage(String),
    
    #[error("Username already taken: {0}")]
    DuplicateUsername(String),
    
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    
    #[error("Unsupported storage backend: {0}")]
    UnsupportedBackend(String),
    
    #[error("Connection error: {0}")]
    Connection(String),
    
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PersistError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound(_) | Self::MessageNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;
