//! Process-local store used by default and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parley_types::{Message, NewMessage, NewSession, NewUser, Session, SessionUpdate, User};
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::trait_client::ConversationStore;

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    sessions: HashMap<String, Session>,
    /// Messages per session in insertion order
    messages: HashMap<String, Vec<Message>>,
    /// Message id to owning session id
    message_index: HashMap<String, String>,
}

impl Tables {
    fn push_message(&mut self, message: Message) {
        self.message_index
            .insert(message.id.clone(), message.session_id.clone());
        let list = self.messages.entry(message.session_id.clone()).or_default();
        list.push(message);
        // Stable, so equal timestamps keep insertion order
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }
    
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }
    
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }
    
    async fn create_user(&self, user: NewUser) -> Result<User> {
        user.validate()?;
        
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(PersistError::DuplicateUsername(user.username));
        }
        
        let user = user.into_user(Utc::now());
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
    
    async fn get_session(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.tables.read().await.sessions.get(id).cloned())
    }
    
    async fn list_user_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(sessions)
    }
    
    async fn create_session(&self, session: NewSession) -> Result<Session> {
        session.validate()?;
        
        let session = session.into_session(Utc::now());
        self.tables
            .write()
            .await
            .sessions
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }
    
    async fn update_session(&self, id: &str, update: SessionUpdate) -> Result<Session> {
        update.validate()?;
        
        let mut tables = self.tables.write().await;
        let session = tables
            .sessions
            .get_mut(id)
            .ok_or_else(|| PersistError::SessionNotFound(id.to_string()))?;
        update.apply(session, Utc::now());
        Ok(session.clone())
    }
    
    async fn delete_session(&self, id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.sessions.contains_key(id) {
            return Err(PersistError::SessionNotFound(id.to_string()));
        }
        
        if let Some(messages) = tables.messages.remove(id) {
            for message in &messages {
                tables.message_index.remove(&message.id);
            }
            tracing::debug!(session_id = %id, count = messages.len(), "Removed session messages");
        }
        tables.sessions.remove(id);
        Ok(())
    }
    
    async fn get_message(&self, id: &str) -> Result<Option<Message>> {
        let tables = self.tables.read().await;
        let found = tables
            .message_index
            .get(id)
            .and_then(|session_id| tables.messages.get(session_id))
            .and_then(|list| list.iter().find(|m| m.id == id))
            .cloned();
        Ok(found)
    }
    
    async fn get_session_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let tables = self.tables.read().await;
        Ok(tables.messages.get(session_id).cloned().unwrap_or_default())
    }
    
    async fn create_message(&self, message: NewMessage) -> Result<Message> {
        message.validate()?;
        
        let mut tables = self.tables.write().await;
        let mut now = Utc::now();
        
        // Keep creation order visible in timestamps even on a coarse clock
        if let Some(last) = tables
            .messages
            .get(&message.session_id)
            .and_then(|list| list.last())
        {
            if last.created_at > now {
                now = last.created_at;
            }
        }
        
        let session = tables
            .sessions
            .get_mut(&message.session_id)
            .ok_or_else(|| PersistError::SessionNotFound(message.session_id.clone()))?;
        session.touch(now);
        
        let message = message.into_message(now);
        tables.push_message(message.clone());
        Ok(message)
    }
    
    async fn insert_message(&self, message: Message) -> Result<Message> {
        message.validate()?;
        let mut tables = self.tables.write().await;
        if tables.message_index.contains_key(&message.id) {
            return Err(PersistError::DuplicateMessage(message.id));
        }
        let session = tables
            .sessions
            .get_mut(&message.session_id)
            .ok_or_else(|| PersistError::SessionNotFound(message.session_id.clone()))?;
        session.touch(message.created_at);
        
        tables.push_message(message.clone());
        Ok(message)
    }
    
    async fn delete_message(&self, id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let session_id = tables
            .message_index
            .remove(id)
            .ok_or_else(|| PersistError::MessageNotFound(id.to_string()))?;
        if let Some(list) = tables.messages.get_mut(&session_id) {
            list.retain(|m| m.id != id);
        }
        Ok(())
    }
}
