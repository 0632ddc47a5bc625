use anyhow::Result;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::traits::{ChatClient, ChatRequest};

/// Characters per token used when a provider never reports usage
pub const CHARS_PER_TOKEN: usize = 4;

/// Raw event produced by a vendor stream before normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental text fragment
    Token {
        content: String,
    },
    
    /// Usage total reported by the vendor (may arrive more than once)
    Usage {
        total_tokens: u32,
    },
}

/// Normalized event handed to callers of [`stream_completion`]
///
/// A completion stream yields zero or more `Token`s followed by exactly one
/// terminal `Done` or `Error`, and nothing after that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompletionEvent {
    Token {
        content: String,
    },
    
    Done {
        total_tokens: u32,
    },
    
    Error {
        message: String,
    },
}

impl CompletionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;
pub type CompletionStream = Pin<Box<dyn Stream<Item = CompletionEvent> + Send>>;

/// Best-effort token count for `chars` characters of output
pub fn estimate_tokens(chars: usize) -> u32 {
    let tokens = chars.div_ceil(CHARS_PER_TOKEN);
    u32::try_from(tokens).unwrap_or(u32::MAX)
}

/// Open a streaming completion and normalize it.
///
/// Anything that fails before the vendor stream is open (empty history,
/// connection errors, non-2xx status) is returned as `Err`.
pub async fn stream_completion(
    client: &dyn ChatClient,
    request: ChatRequest,
) -> Result<CompletionStream> {
    if request.messages.is_empty() {
        anyhow::bail!("Conversation history must not be empty");
    }
    
    tracing::debug!(
        provider = client.provider(),
        model = %request.model,
        messages = request.messages.len(),
        "Opening completion stream"
    );
    
    let raw = client.chat_stream(request).await?;
    Ok(normalize(raw))
}

/// Turn a raw vendor stream into a [`CompletionStream`] with one terminal event
pub fn normalize(raw: EventStream) -> CompletionStream {
    Box::pin(async_stream::stream! {
        let mut raw = raw;
        let mut generated_chars = 0usize;
        let mut fragments = 0usize;
        let mut reported_usage: Option<u32> = None;
        let mut failure: Option<String> = None;
        
        while let Some(item) = raw.next().await {
            match item {
                Ok(StreamEvent::Token { content }) => {
                    if content.is_empty() {
                        continue;
                    }
                    generated_chars += content.chars().count();
                    fragments += 1;
                    yield CompletionEvent::Token { content };
                }
                Ok(StreamEvent::Usage { total_tokens }) => {
                    if total_tokens > 0 {
                        reported_usage = Some(total_tokens);
                    }
                }
                Err(e) => {
                    failure = Some(format!("{:#}", e));
                    break;
                }
            }
        }
        
        if failure.is_none() && fragments == 0 {
            failure = Some("Provider returned an empty response".to_string());
        }
        
        match failure {
            Some(message) => yield CompletionEvent::Error { message },
            None => {
                let total_tokens = reported_usage
                    .unwrap_or_else(|| estimate_tokens(generated_chars));
                yield CompletionEvent::Done { total_tokens };
            }
        }
    })
}
