use async_trait::async_trait;
use chrono::Utc;
use mongodb::{bson::Document, Client};
use parley_types::{Message, NewMessage, NewSession, NewUser, Session, SessionUpdate, User};

use crate::dbs::mongo::models::{MongoMessage, MongoSession, MongoUser};
use crate::dbs::mongo::repositories::{
    MongoMessageRepository, MongoSessionRepository, MongoUserRepository,
};
use crate::error::{PersistError, Result};
use crate::trait_client::ConversationStore;

pub struct MongoStore {
    user_repo: MongoUserRepository,
    session_repo: MongoSessionRepository,
    message_repo: MongoMessageRepository,
}

impl MongoStore {
    /// Connect to MongoDB and make sure the indexes exist
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        
        let store = Self {
            user_repo: MongoUserRepository::new(&client, database),
            session_repo: MongoSessionRepository::new(&client, database),
            message_repo: MongoMessageRepository::new(&client, database),
        };
        store.user_repo.ensure_indexes().await?;
        store.message_repo.ensure_indexes().await?;
        
        tracing::info!(database = %database, "Connected to MongoDB");
        Ok(store)
    }
}

fn update_fields(update: SessionUpdate) -> Document {
    let mut fields = Document::new();
    if let Some(title) = update.title {
        fields.insert("title", title);
    }
    if let Some(provider) = update.provider {
        fields.insert("provider", provider);
    }
    if let Some(model) = update.model {
        fields.insert("model", model);
    }
    fields
}

#[async_trait]
impl ConversationStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }
    
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.user_repo.get_user(id).await?.map(Into::into))
    }
    
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.user_repo.get_by_username(username).await?.map(Into::into))
    }
    
    async fn create_user(&self, user: NewUser) -> Result<User> {
        user.validate()?;
        let user = user.into_user(Utc::now());
        self.user_repo.insert_user(&MongoUser::from(user.clone())).await?;
        Ok(user)
    }
    
    async fn get_session(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.session_repo.get_session(id).await?.map(Into::into))
    }
    
    async fn list_user_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        let sessions = self.session_repo.list_sessions(user_id).await?;
        Ok(sessions.into_iter().map(Into::into).collect())
    }
    
    async fn create_session(&self, session: NewSession) -> Result<Session> {
        session.validate()?;
        let session = session.into_session(Utc::now());
        self.session_repo
            .insert_session(&MongoSession::from(session.clone()))
            .await?;
        Ok(session)
    }
    
    async fn update_session(&self, id: &str, update: SessionUpdate) -> Result<Session> {
        update.validate()?;
        self.session_repo
            .update_session(id, update_fields(update), Utc::now())
            .await?
            .map(Into::into)
            .ok_or_else(|| PersistError::SessionNotFound(id.to_string()))
    }
    
    async fn delete_session(&self, id: &str) -> Result<()> {
        if self.session_repo.get_session(id).await?.is_none() {
            return Err(PersistError::SessionNotFound(id.to_string()));
        }
        
        let removed = self.message_repo.delete_for_session(id).await?;
        tracing::debug!(session_id = %id, count = removed, "Removed session messages");
        
        if !self.session_repo.delete_session(id).await? {
            return Err(PersistError::SessionNotFound(id.to_string()));
        }
        Ok(())
    }
    
    async fn get_message(&self, id: &str) -> Result<Option<Message>> {
        Ok(self.message_repo.get_message(id).await?.map(Into::into))
    }
    
    async fn get_session_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let messages = self.message_repo.get_messages(session_id).await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }
    
    async fn create_message(&self, message: NewMessage) -> Result<Message> {
        message.validate()?;
        self.insert_message(message.into_message(Utc::now())).await
    }
    
    async fn insert_message(&self, message: Message) -> Result<Message> {
        message.validate()?;
        if self.session_repo.get_session(&message.session_id).await?.is_none() {
            return Err(PersistError::SessionNotFound(message.session_id.clone()));
        }
        
        self.message_repo
            .save_message(&MongoMessage::from(message.clone()))
            .await?;
        self.session_repo
            .touch(&message.session_id, message.created_at)
            .await?;
        Ok(message)
    }
    
    async fn delete_message(&self, id: &str) -> Result<()> {
        if !self.message_repo.delete_message(id).await? {
            return Err(PersistError::MessageNotFound(id.to_string()));
        }
        Ok(())
    }
}
