use axum::{
    extract::{Path, State},
    Json,
};
use parley_types::Message;
use std::sync::Arc;

use crate::{error::ApiResult, state::AppState};

/// Messages of a session in creation order
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    let messages = state.store.get_session_messages(&session_id).await?;
    Ok(Json(messages))
}
