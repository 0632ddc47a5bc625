use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures::stream::StreamExt;
use parley_chat::SendMessage;
use parley_types::{encode_frame_bytes, EVENT_STREAM_CONTENT_TYPE};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    pub provider: String,
    pub model: String,
}

/// Send a message and stream the response as chat event frames
/// 
/// Unknown sessions and unavailable providers are rejected with a plain
/// JSON error before the stream starts. Provider failures after that point
/// arrive as an `error` event inside the stream.
pub async fn send_message_stream(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload?;
    
    let run = state
        .chat
        .start(SendMessage {
            session_id: session_id.clone(),
            content: req.content,
            provider: req.provider,
            model: req.model,
        })
        .await?;
    
    tracing::info!(
        session_id = %session_id,
        message_id = %run.user_message.id,
        "Streaming chat response"
    );
    
    // Convert Receiver to Stream of encoded frames
    let frames = ReceiverStream::new(run.events).filter_map(|event| async move {
        match encode_frame_bytes(&event) {
            Ok(frame) => Some(Ok::<Bytes, Infallible>(frame)),
            Err(e) => {
                tracing::error!("Dropping unencodable {} event: {}", event.kind(), e);
                None
            }
        }
    });
    
    let mut response = (StatusCode::OK, Body::from_stream(frames)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(EVENT_STREAM_CONTENT_TYPE),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    
    Ok(response)
}
