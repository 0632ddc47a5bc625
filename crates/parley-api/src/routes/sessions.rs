use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use parley_types::{NewSession, Session, SessionUpdate, SessionWithMessages};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    routes::users::demo_user,
    state::AppState,
};

const DEFAULT_TITLE: &str = "New Chat";

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Sessions of the demo user, most recently updated first
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Session>>> {
    let user = demo_user(&state).await?;
    let sessions = state.store.list_user_sessions(&user.id).await?;
    Ok(Json(sessions))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionWithMessages>> {
    let session = state
        .store
        .get_session_with_messages(&session_id)
        .await?
        .ok_or(ApiError::SessionNotFound(session_id))?;
    
    Ok(Json(session))
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let Json(req) = payload?;
    let user = demo_user(&state).await?;
    
    let title = req
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let session = state
        .store
        .create_session(NewSession {
            user_id: user.id,
            title,
            provider: req.provider,
            model: req.model,
        })
        .await?;
    
    tracing::info!(session_id = %session.id, provider = %session.provider, "Session created");
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn update_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    payload: Result<Json<SessionUpdate>, JsonRejection>,
) -> ApiResult<Json<Session>> {
    let Json(update) = payload?;
    let session = state.store.update_session(&session_id, update).await?;
    Ok(Json(session))
}

/// Delete a session together with its messages
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    state.store.delete_session(&session_id).await?;
    tracing::info!(session_id = %session_id, "Session deleted");
    Ok(Json(DeleteResponse { success: true }))
}
