// Google Gemini streamGenerateContent client

use crate::buffer_utils::{parse_sse_stream, SseLineParser};
use crate::streaming::{EventStream, StreamEvent};
use crate::traits::{ChatClient, ChatRequest};
use crate::types::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const GEMINI_MODELS: &[&str] = &[
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
];

const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&api_key).context("Invalid API key format")?,
        );
        
        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;
        
        Ok(Self {
            http_client,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }
    
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
    
    /// Gemini takes system text as `systemInstruction` and calls the assistant `model`
    fn build_request(&self, request: &ChatRequest) -> Value {
        let (system, turns) = request.split_system();
        
        let contents: Vec<Value> = turns
            .into_iter()
            .map(|msg| {
                let role = match msg {
                    Message::AI { .. } => "model",
                    _ => "user",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": msg.content() }],
                })
            })
            .collect();
        
        let mut body = serde_json::json!({ "contents": contents });
        
        if let Some(obj) = body.as_object_mut() {
            if let Some(system) = system {
                obj.insert(
                    "systemInstruction".to_string(),
                    serde_json::json!({ "parts": [{ "text": system }] }),
                );
            }
            
            let mut generation = serde_json::Map::new();
            if let Some(temp) = request.options.temperature {
                generation.insert("temperature".to_string(), serde_json::json!(temp));
            }
            if let Some(max_tokens) = request.options.max_tokens {
                generation.insert("maxOutputTokens".to_string(), serde_json::json!(max_tokens));
            }
            if !generation.is_empty() {
                obj.insert("generationConfig".to_string(), Value::Object(generation));
            }
        }
        
        body
    }
    
    fn stream_url(&self, model: &str) -> String {
        let model = if model.is_empty() { DEFAULT_MODEL } else { model };
        format!("{}/models/{}:streamGenerateContent?alt=sse", self.base_url, model)
    }
}

#[async_trait]
impl ChatClient for GeminiClient {
    fn provider(&self) -> &str {
        "gemini"
    }
    
    fn display_name(&self) -> &str {
        "Google Gemini"
    }
    
    fn models(&self) -> Vec<String> {
        GEMINI_MODELS.iter().map(|m| m.to_string()).collect()
    }
    
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let body = self.build_request(&request);
        
        let response = self
            .http_client
            .post(self.stream_url(&request.model))
            .json(&body)
            .send()
            .await
            .context("Failed to send request")?;
        
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }
        
        Ok(parse_sse_stream(response, GenerateContentParser))
    }
}

/// Parses `GenerateContentResponse` payloads; the stream ends when the body closes
struct GenerateContentParser;

impl SseLineParser for GenerateContentParser {
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>> {
        let chunk: GenerateContentChunk = serde_json::from_str(data)
            .context("Failed to parse Gemini chunk")?;
        
        if let Some(error) = chunk.error {
            anyhow::bail!("Gemini stream error: {}", error.message);
        }
        
        let text: String = chunk
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();
        
        let mut events = Vec::new();
        if !text.is_empty() {
            events.push(StreamEvent::Token { content: text });
        }
        if let Some(total) = chunk.usage_metadata.and_then(|u| u.total_token_count) {
            events.push(StreamEvent::Usage { total_tokens: total });
        }
        
        Ok(events)
    }
    
    fn is_done_marker(&self, _data: &str) -> bool {
        false
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new("test-key").unwrap()
    }

    #[test]
    fn test_system_becomes_instruction() {
        let request = ChatRequest::new(
            "gemini-2.5-pro",
            vec![
                Message::system("You are terse."),
                Message::human("Hi"),
                Message::ai("Hello"),
                Message::human("Again"),
            ],
        );
        let body = client().build_request(&request);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are terse.");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "Again");
    }

    #[test]
    fn test_no_system_instruction_without_system_turns() {
        let body = client().build_request(&ChatRequest::new("gemini-1.5-pro", vec![Message::human("Hi")]));
        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_empty_model_falls_back() {
        assert!(client().stream_url("").contains("models/gemini-2.5-flash:streamGenerateContent"));
    }

    #[test]
    fn test_parse_chunk_with_usage() {
        let data = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hi "},{"text":"there"}]}}],"usageMetadata":{"promptTokenCount":3,"totalTokenCount":9}}"#;
        let events = GenerateContentParser.parse_data_line(data).unwrap();

        assert_eq!(
            events,
            vec![
                StreamEvent::Token { content: "Hi there".to_string() },
                StreamEvent::Usage { total_tokens: 9 },
            ]
        );
    }
}
