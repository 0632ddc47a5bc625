use async_trait::async_trait;
use parley_types::{
    Message, NewMessage, NewSession, NewUser, Session, SessionUpdate, SessionWithMessages, User,
};

use crate::error::{PersistError, Result};

/// Storage operations for users, sessions and messages.
///
/// Implementations validate their inputs, order messages by creation time
/// and list sessions most recently updated first.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;
    
    async fn get_user(&self, id: &str) -> Result<Option<User>>;
    
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    
    /// Fails with `DuplicateUsername` when the username is taken
    async fn create_user(&self, user: NewUser) -> Result<User>;
    
    async fn get_session(&self, id: &str) -> Result<Option<Session>>;
    
    async fn list_user_sessions(&self, user_id: &str) -> Result<Vec<Session>>;
    
    async fn create_session(&self, session: NewSession) -> Result<Session>;
    
    /// Merge the supplied fields and refresh `updated_at`
    async fn update_session(&self, id: &str, update: SessionUpdate) -> Result<Session>;
    
    /// Remove the session's messages, then the session
    async fn delete_session(&self, id: &str) -> Result<()>;
    
    async fn get_message(&self, id: &str) -> Result<Option<Message>>;
    
    /// Messages in creation order; empty for an unknown session
    async fn get_session_messages(&self, session_id: &str) -> Result<Vec<Message>>;
    
    /// Append a message and bump the owning session's `updated_at`
    async fn create_message(&self, message: NewMessage) -> Result<Message>;
    
    /// Store a fully formed record as is, keeping its id and timestamp
    async fn insert_message(&self, message: Message) -> Result<Message>;
    
    async fn delete_message(&self, id: &str) -> Result<()>;
    
    async fn get_session_with_messages(&self, id: &str) -> Result<Option<SessionWithMessages>> {
        let Some(session) = self.get_session(id).await? else {
            return Ok(None);
        };
        let messages = self.get_session_messages(id).await?;
        Ok(Some(SessionWithMessages { session, messages }))
    }
    
    /// Fetch a user by username, creating it on first use.
    ///
    /// Losing a creation race to another caller re-reads the winner's record.
    async fn ensure_user(&self, user: NewUser) -> Result<User> {
        if let Some(existing) = self.get_user_by_username(&user.username).await? {
            return Ok(existing);
        }
        
        let username = user.username.clone();
        match self.create_user(user).await {
            Ok(created) => {
                tracing::info!(user_id = %created.id, username = %created.username, "Created user");
                Ok(created)
            }
            Err(PersistError::DuplicateUsername(_)) => self
                .get_user_by_username(&username)
                .await?
                .ok_or_else(|| PersistError::Internal(format!("User {} vanished after conflict", username))),
            Err(e) => Err(e),
        }
    }
}
