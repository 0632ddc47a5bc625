use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use super::user::is_duplicate_key;
use crate::dbs::mongo::models::MongoMessage;
use crate::error::{PersistError, Result};

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }
    
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = mongodb::IndexModel::builder()
            .keys(doc! { "session_id": 1, "created_at": 1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
    
    pub async fn save_message(&self, message: &MongoMessage) -> Result<()> {
        match self.collection.insert_one(message).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(PersistError::DuplicateMessage(message.id.clone())),
            Err(e) => Err(e.into()),
        }
    }
    
    pub async fn get_message(&self, id: &str) -> Result<Option<MongoMessage>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }
    
    /// All messages for a session in creation order
    pub async fn get_messages(&self, session_id: &str) -> Result<Vec<MongoMessage>> {
        let messages = self
            .collection
            .find(doc! { "session_id": session_id })
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }
    
    /// Returns the number of removed messages
    pub async fn delete_for_session(&self, session_id: &str) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "session_id": session_id })
            .await?;
        Ok(result.deleted_count)
    }
    
    pub async fn delete_message(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
