// OpenAI Chat Completions streaming client

use crate::buffer_utils::{parse_sse_stream, SseLineParser};
use crate::streaming::{EventStream, StreamEvent};
use crate::traits::{ChatClient, ChatOptions, ChatRequest};
use crate::types::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub const OPENAI_MODELS: &[&str] = &["gpt-5", "gpt-4", "gpt-4-turbo", "gpt-3.5-turbo"];

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 2000;

/// OpenAI client (HTTP direct, no SDK)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );
        
        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;
        
        Ok(Self {
            http_client,
            base_url: OPENAI_API_BASE.to_string(),
        })
    }
    
    /// Point the client at a different API base (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
    
    /// Build chat completion request payload
    fn build_chat_request(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Value {
        let openai_messages: Vec<Value> = messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role(),
                    "content": msg.content(),
                })
            })
            .collect();
        
        let mut request = serde_json::json!({
            "model": model,
            "messages": openai_messages,
            "stream": true,
            "stream_options": { "include_usage": true },
        });
        
        // Reasoning families reject temperature and rename max_tokens
        let is_reasoning_model = model.starts_with("o1") || model.starts_with("gpt-5");
        let temperature = options.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        let max_tokens = options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        
        if let Some(obj) = request.as_object_mut() {
            if !is_reasoning_model {
                obj.insert("temperature".to_string(), serde_json::json!(temperature));
            }
            let token_field = if is_reasoning_model {
                "max_completion_tokens"
            } else {
                "max_tokens"
            };
            obj.insert(token_field.to_string(), serde_json::json!(max_tokens));
        }
        
        request
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    fn provider(&self) -> &str {
        "openai"
    }
    
    fn display_name(&self) -> &str {
        "OpenAI"
    }
    
    fn models(&self) -> Vec<String> {
        OPENAI_MODELS.iter().map(|m| m.to_string()).collect()
    }
    
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = self.build_chat_request(&request.model, &request.messages, &request.options);
        
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;
        
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }
        
        Ok(parse_sse_stream(response, ChatChunkParser))
    }
}

/// Parses `chat.completion.chunk` payloads
struct ChatChunkParser;

impl SseLineParser for ChatChunkParser {
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>> {
        let chunk: ChatStreamChunk = serde_json::from_str(data)
            .context("Failed to parse chat chunk")?;
        
        if let Some(error) = chunk.error {
            anyhow::bail!("OpenAI stream error: {}", error.message);
        }
        
        let mut events = Vec::new();
        
        if let Some(content) = chunk
            .choices
            .first()
            .and_then(|c| c.delta.content.as_ref())
        {
            if !content.is_empty() {
                events.push(StreamEvent::Token {
                    content: content.clone(),
                });
            }
        }
        
        // Final chunk (include_usage) has empty choices and a usage block
        if let Some(usage) = chunk.usage {
            events.push(StreamEvent::Usage {
                total_tokens: usage.total_tokens,
            });
        }
        
        Ok(events)
    }
}

#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    usage: Option<Usage>,
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAIClient {
        OpenAIClient::new("test-key").unwrap()
    }

    #[test]
    fn test_payload_for_chat_model() {
        let messages = vec![Message::system("be brief"), Message::human("hi")];
        let payload = client().build_chat_request("gpt-4", &messages, &ChatOptions::default());

        assert_eq!(payload["stream"], true);
        assert_eq!(payload["max_tokens"], 2000);
        assert!(payload["temperature"].is_number());
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_payload_for_reasoning_model() {
        let payload = client().build_chat_request(
            "gpt-5",
            &[Message::human("hi")],
            &ChatOptions::new().max_tokens(10),
        );

        assert!(payload.get("temperature").is_none());
        assert!(payload.get("max_tokens").is_none());
        assert_eq!(payload["max_completion_tokens"], 10);
    }

    #[test]
    fn test_parse_content_chunk() {
        let data = r#"{"id":"c1","object":"chat.completion.chunk","created":1,"model":"gpt-4","choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}"#;
        let events = ChatChunkParser.parse_data_line(data).unwrap();

        assert_eq!(events, vec![StreamEvent::Token { content: "Hel".to_string() }]);
    }

    #[test]
    fn test_parse_usage_chunk() {
        let data = r#"{"id":"c1","choices":[],"usage":{"prompt_tokens":5,"completion_tokens":7,"total_tokens":12}}"#;
        let events = ChatChunkParser.parse_data_line(data).unwrap();

        assert_eq!(events, vec![StreamEvent::Usage { total_tokens: 12 }]);
    }

    #[test]
    fn test_parse_error_chunk() {
        let data = r#"{"error":{"message":"model overloaded"}}"#;
        let err = ChatChunkParser.parse_data_line(data).unwrap_err();

        assert!(err.to_string().contains("model overloaded"));
    }

    #[test]
    fn test_done_marker() {
        assert!(ChatChunkParser.is_done_marker("[DONE]"));
    }
}
