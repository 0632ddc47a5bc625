use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{bson::doc, Client, Collection, IndexModel};

use crate::dbs::mongo::models::MongoUser;
use crate::error::{PersistError, Result};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<MongoUser>,
}

impl MongoUserRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("users");
        Self { collection }
    }
    
    /// Unique index backing the username constraint
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
    
    pub async fn get_user(&self, id: &str) -> Result<Option<MongoUser>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }
    
    pub async fn get_by_username(&self, username: &str) -> Result<Option<MongoUser>> {
        Ok(self.collection.find_one(doc! { "username": username }).await?)
    }
    
    pub async fn insert_user(&self, user: &MongoUser) -> Result<()> {
        match self.collection.insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                Err(PersistError::DuplicateUsername(user.username.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

pub(crate) fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY
    )
}
