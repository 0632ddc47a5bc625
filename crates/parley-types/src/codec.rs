//! Wire encoding for chat event streams.
//!
//! Each event is one `data: <json>` line followed by a blank line. The
//! decoder buffers raw bytes, so frames may be split across reads or several
//! frames may arrive in a single read.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use parley_llm::CircularLineBuffer;
use std::fmt::Display;
use thiserror::Error;

use crate::events::ChatEvent;

pub const FRAME_PREFIX: &str = "data:";
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
    
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Encode one event as a complete frame
pub fn encode_frame(event: &ChatEvent) -> Result<String, CodecError> {
    let payload = serde_json::to_string(event)?;
    Ok(format!("{} {}\n\n", FRAME_PREFIX, payload))
}

pub fn encode_frame_bytes(event: &ChatEvent) -> Result<Bytes, CodecError> {
    encode_frame(event).map(Bytes::from)
}

/// Incremental frame decoder
pub struct FrameDecoder {
    buffer: CircularLineBuffer,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buffer: CircularLineBuffer::with_capacity(4096),
        }
    }
    
    /// Feed raw bytes; returns every event completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<ChatEvent> {
        self.buffer.extend(bytes);
        
        let mut events = Vec::new();
        while let Some(line) = self.buffer.next_line() {
            match line {
                Ok(line) => events.extend(decode_line(&line)),
                Err(e) => tracing::warn!("Skipping undecodable line: {}", e),
            }
        }
        events
    }
    
    /// End of input: decode a trailing line that never got its newline
    pub fn finish(&mut self) -> Vec<ChatEvent> {
        match self.buffer.take_remaining() {
            Some(Ok(line)) => decode_line(&line).into_iter().collect(),
            Some(Err(e)) => {
                tracing::warn!("Skipping undecodable trailing line: {}", e);
                Vec::new()
            }
            None => Vec::new(),
        }
    }
    
    /// Bytes waiting for a line terminator
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(line: &str) -> Option<ChatEvent> {
    let payload = line.strip_prefix(FRAME_PREFIX)?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    if payload.is_empty() {
        return None;
    }
    
    match serde_json::from_str::<ChatEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping malformed event payload");
            None
        }
    }
}

/// Decode a byte stream into events.
///
/// A transport error is yielded once and ends the stream.
pub fn decode_stream<S, E>(bytes: S) -> impl Stream<Item = Result<ChatEvent, CodecError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    async_stream::stream! {
        let mut chunks = Box::pin(bytes);
        let mut decoder = FrameDecoder::new();
        
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    for event in decoder.push(&bytes) {
                        yield Ok(event);
                    }
                }
                Err(e) => {
                    yield Err(CodecError::Transport(e.to_string()));
                    return;
                }
            }
        }
        
        for event in decoder.finish() {
            yield Ok(event);
        }
    }
}
