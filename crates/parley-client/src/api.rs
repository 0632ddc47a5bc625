use std::collections::BTreeMap;
use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use parley_llm::ProviderDescriptor;
use parley_types::{
    decode_stream, ChatEvent, CodecError, Message, Session, SessionUpdate, SessionWithMessages,
    User, EVENT_STREAM_CONTENT_TYPE,
};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ClientError, Result};

/// Decoded events of one chat response
pub type ChatEventStream = Pin<Box<dyn Stream<Item = Result<ChatEvent>> + Send>>;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Typed access to the Parley HTTP API
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
    
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
    
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
    
    pub async fn get_user(&self) -> Result<User> {
        self.json(self.client.get(self.url("/api/user"))).await
    }
    
    pub async fn get_providers(&self) -> Result<BTreeMap<String, ProviderDescriptor>> {
        self.json(self.client.get(self.url("/api/providers"))).await
    }
    
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.json(self.client.get(self.url("/api/sessions"))).await
    }
    
    pub async fn get_session(&self, session_id: &str) -> Result<SessionWithMessages> {
        let url = self.url(&format!("/api/sessions/{}", session_id));
        self.json(self.client.get(url)).await
    }
    
    pub async fn create_session(&self, title: &str, provider: &str, model: &str) -> Result<Session> {
        let body = json!({ "title": title, "provider": provider, "model": model });
        self.json(self.client.post(self.url("/api/sessions")).json(&body)).await
    }
    
    pub async fn update_session(&self, session_id: &str, update: &SessionUpdate) -> Result<Session> {
        let url = self.url(&format!("/api/sessions/{}", session_id));
        self.json(self.client.patch(url).json(update)).await
    }
    
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let url = self.url(&format!("/api/sessions/{}", session_id));
        check(self.client.delete(url).send().await?).await?;
        Ok(())
    }
    
    pub async fn list_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let url = self.url(&format!("/api/sessions/{}/messages", session_id));
        self.json(self.client.get(url)).await
    }
    
    /// Post a user message and return the decoded response stream.
    ///
    /// Rejections before streaming (unknown session, unavailable provider)
    /// come back as [`ClientError::Api`].
    pub async fn send_message(
        &self,
        session_id: &str,
        content: &str,
        provider: &str,
        model: &str,
    ) -> Result<ChatEventStream> {
        let url = self.url(&format!("/api/sessions/{}/messages", session_id));
        let body = json!({ "content": content, "provider": provider, "model": model });
        let response = check(self.client.post(url).json(&body).send().await?).await?;
        
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with(EVENT_STREAM_CONTENT_TYPE) {
            return Err(ClientError::NotStreaming(content_type));
        }
        
        let events = decode_stream(response.bytes_stream()).map(|item| {
            item.map_err(|e| match e {
                CodecError::Transport(msg) => ClientError::Transport(msg),
                other => ClientError::Transport(other.to_string()),
            })
        });
        Ok(Box::pin(events))
    }
    
    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = check(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Turn a non-success response into [`ClientError::Api`]
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    
    tracing::debug!(status = status.as_u16(), error = %message, "API request rejected");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
