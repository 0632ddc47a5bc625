use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::{bson, bson::doc, bson::Document, Client, Collection};

use crate::dbs::mongo::models::MongoSession;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoSessionRepository {
    collection: Collection<MongoSession>,
}

impl MongoSessionRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("sessions");
        Self { collection }
    }
    
    pub async fn insert_session(&self, session: &MongoSession) -> Result<()> {
        self.collection.insert_one(session).await?;
        Ok(())
    }
    
    pub async fn get_session(&self, id: &str) -> Result<Option<MongoSession>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }
    
    /// Sessions for a user, most recently updated first
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<MongoSession>> {
        let sessions = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "updated_at": -1, "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(sessions)
    }
    
    /// Apply `$set` fields plus a fresh `updated_at`; `None` when missing
    pub async fn update_session(
        &self,
        id: &str,
        mut fields: Document,
        now: DateTime<Utc>,
    ) -> Result<Option<MongoSession>> {
        fields.insert("updated_at", bson::DateTime::from_chrono(now));
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": fields })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }
    
    /// Move `updated_at` forward to `at` if it is older
    pub async fn touch(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        self.collection
            .update_one(
                doc! { "_id": id },
                doc! { "$max": { "updated_at": bson::DateTime::from_chrono(at) } },
            )
            .await?;
        Ok(())
    }
    
    /// Returns whether a session was removed
    pub async fn delete_session(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
