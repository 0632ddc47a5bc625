use std::sync::{Arc, Mutex, MutexGuard};

use futures::StreamExt;
use parley_types::{derive_title, ChatEvent};
use tokio::sync::Notify;

use crate::api::ApiClient;
use crate::conversation::Conversation;
use crate::error::{ClientError, Result};

/// Where a [`ChatSession`] is in its send cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
    Streaming,
}

/// How a call to [`ChatSession::send`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The stream ended with `done`
    Completed,
    /// Another send was already in flight
    Ignored,
    /// [`ChatSession::cancel`] closed the connection
    Cancelled,
}

struct Target {
    session_id: String,
    provider: String,
    model: String,
}

struct Selection {
    session_id: Option<String>,
    provider: String,
    model: String,
}

/// Client side of one conversation: at most one send in flight.
pub struct ChatSession {
    api: ApiClient,
    selection: Mutex<Selection>,
    state: Arc<Mutex<SessionState>>,
    conversation: Mutex<Conversation>,
    cancel: Notify,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Puts the session back to `Idle` however the send ends
struct IdleOnDrop(Arc<Mutex<SessionState>>);

impl Drop for IdleOnDrop {
    fn drop(&mut self) {
        *lock(&self.0) = SessionState::Idle;
    }
}

impl ChatSession {
    pub fn new(api: ApiClient, provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api,
            selection: Mutex::new(Selection {
                session_id: None,
                provider: provider.into(),
                model: model.into(),
            }),
            state: Arc::new(Mutex::new(SessionState::Idle)),
            conversation: Mutex::new(Conversation::new()),
            cancel: Notify::new(),
        }
    }
    
    /// Switch to an existing session and load its messages
    pub async fn open(&self, session_id: &str) -> Result<()> {
        let full = self.api.get_session(session_id).await?;
        {
            let mut selection = lock(&self.selection);
            selection.session_id = Some(full.session.id.clone());
            selection.provider = full.session.provider.clone();
            selection.model = full.session.model.clone();
        }
        *lock(&self.conversation) = Conversation::from_messages(full.messages);
        Ok(())
    }
    
    /// Forget the current session; the next send starts a new one
    pub fn reset(&self) {
        lock(&self.selection).session_id = None;
        lock(&self.conversation).clear();
    }
    
    pub fn select_model(&self, provider: impl Into<String>, model: impl Into<String>) {
        let mut selection = lock(&self.selection);
        selection.provider = provider.into();
        selection.model = model.into();
    }
    
    pub fn session_id(&self) -> Option<String> {
        lock(&self.selection).session_id.clone()
    }
    
    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }
    
    /// Snapshot of the local conversation
    pub fn conversation(&self) -> Conversation {
        lock(&self.conversation).clone()
    }
    
    /// Close the in-flight stream, if any, without waiting for its end
    pub fn cancel(&self) {
        self.cancel.notify_waiters();
    }
    
    /// Send `content` and apply the streamed events locally.
    ///
    /// Creates a session titled after the content when none is selected.
    /// That creation is not interrupted by [`ChatSession::cancel`], so the new
    /// session id is always kept; a cancel arriving meanwhile takes effect
    /// before the message is posted. An `error` event is returned as
    /// [`ClientError::Stream`].
    pub async fn send(&self, content: impl Into<String>) -> Result<SendOutcome> {
        {
            let mut state = lock(&self.state);
            if *state != SessionState::Idle {
                tracing::debug!(state = ?*state, "Send ignored while another is in flight");
                return Ok(SendOutcome::Ignored);
            }
            *state = SessionState::Sending;
        }
        let _idle = IdleOnDrop(Arc::clone(&self.state));
        
        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();
        
        let content = content.into();
        let target = self.resolve_target(&content).await?;
        
        tokio::select! {
            biased;
            _ = &mut cancelled => {
                tracing::info!("Chat stream cancelled");
                Ok(SendOutcome::Cancelled)
            }
            result = self.exchange(target, content) => result,
        }
    }
    
    /// Session, provider and model for the next send, creating the session if needed
    async fn resolve_target(&self, content: &str) -> Result<Target> {
        let (session_id, provider, model) = {
            let selection = lock(&self.selection);
            (
                selection.session_id.clone(),
                selection.provider.clone(),
                selection.model.clone(),
            )
        };
        
        let session_id = match session_id {
            Some(id) => id,
            None => {
                let session = self
                    .api
                    .create_session(&derive_title(content), &provider, &model)
                    .await?;
                tracing::debug!(session_id = %session.id, "Created session for first message");
                lock(&self.selection).session_id = Some(session.id.clone());
                session.id
            }
        };
        
        Ok(Target {
            session_id,
            provider,
            model,
        })
    }
    
    async fn exchange(&self, target: Target, content: String) -> Result<SendOutcome> {
        let Target {
            session_id,
            provider,
            model,
        } = target;
        
        let mut events = self
            .api
            .send_message(&session_id, &content, &provider, &model)
            .await?;
        *lock(&self.state) = SessionState::Streaming;
        
        while let Some(event) = events.next().await {
            let event = event?;
            lock(&self.conversation).apply(&event);
            match event {
                ChatEvent::Done => return Ok(SendOutcome::Completed),
                ChatEvent::Error { error } => return Err(ClientError::Stream(error)),
                ChatEvent::Message { .. } | ChatEvent::Token { .. } => {}
            }
        }
        
        Err(ClientError::Transport(
            "Stream ended without a terminal event".to_string(),
        ))
    }
}
