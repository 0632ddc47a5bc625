use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    
    /// Non-success status; `message` is the server's `error` field when present
    #[error("{message} (status {status})")]
    Api {
        status: u16,
        message: String,
    },
    
    #[error("Expected an event stream, got content type {0}")]
    NotStreaming(String),
    
    /// `error` event received on the chat stream
    #[error("{0}")]
    Stream(String),
    
    #[error("Connection lost: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
