use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parley_chat::ChatError;
use parley_persist::PersistError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    
    #[error("Message not found: {0}")]
    MessageNotFound(String),
    
    #[error("Provider {0} not available")]
    ProviderUnavailable(String),
    
    #[error("Invalid request: {0}")]
    BadRequest(String),
    
    #[error("Session {0} already has a response in progress")]
    SessionBusy(String),
    
    #[error("Persistence error: {0}")]
    Persist(PersistError),
    
    #[error("Internal server error")]
    Internal(String),
}

impl From<PersistError> for ApiError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::SessionNotFound(id) => ApiError::SessionNotFound(id),
            PersistError::MessageNotFound(id) => ApiError::MessageNotFound(id),
            PersistError::Validation(e) => ApiError::BadRequest(e.to_string()),
            PersistError::Internal(detail) => ApiError::Internal(detail),
            other => ApiError::Persist(other),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::SessionNotFound(id) => ApiError::SessionNotFound(id),
            ChatError::ProviderUnavailable(name) => ApiError::ProviderUnavailable(name),
            ChatError::SessionBusy(id) => ApiError::SessionBusy(id),
            ChatError::Validation(e) => ApiError::BadRequest(e.to_string()),
            ChatError::Persist(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::SessionNotFound(_) => {
                (StatusCode::NOT_FOUND, "Session not found".to_string())
            }
            ApiError::MessageNotFound(_) => {
                (StatusCode::NOT_FOUND, "Message not found".to_string())
            }
            ApiError::ProviderUnavailable(_) | ApiError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::SessionBusy(_) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            ApiError::Persist(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Internal(ref detail) => {
                tracing::error!("Internal error: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        
        let body = Json(json!({
            "error": message
        }));
        
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
