use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dbs::memory::InMemoryStore;
use crate::error::{PersistError, Result};
use crate::trait_client::ConversationStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

pub struct StoreBuilder {
    backend: StorageBackend,
    #[cfg_attr(not(feature = "mongodb"), allow(dead_code))]
    mongodb_uri: Option<String>,
    #[cfg_attr(not(feature = "mongodb"), allow(dead_code))]
    database: Option<String>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self {
            backend: StorageBackend::Memory,
            mongodb_uri: None,
            database: None,
        }
    }
    
    pub fn backend(mut self, backend: StorageBackend) -> Self {
        self.backend = backend;
        self
    }
    
    pub fn mongodb_uri(mut self, uri: impl Into<String>) -> Self {
        self.mongodb_uri = Some(uri.into());
        self
    }
    
    pub fn database(mut self, db: impl Into<String>) -> Self {
        self.database = Some(db.into());
        self
    }
    
    pub async fn build(self) -> Result<Arc<dyn ConversationStore>> {
        match self.backend {
            StorageBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
            StorageBackend::Mongodb => self.build_mongo().await,
        }
    }
    
    #[cfg(feature = "mongodb")]
    async fn build_mongo(self) -> Result<Arc<dyn ConversationStore>> {
        let mongodb_uri = self
            .mongodb_uri
            .ok_or_else(|| PersistError::Internal("mongodb_uri is required".to_string()))?;
        let database = self
            .database
            .ok_or_else(|| PersistError::Internal("database is required".to_string()))?;
        
        let store = crate::dbs::mongo::MongoStore::connect(&mongodb_uri, &database).await?;
        Ok(Arc::new(store))
    }
    
    #[cfg(not(feature = "mongodb"))]
    async fn build_mongo(self) -> Result<Arc<dyn ConversationStore>> {
        Err(PersistError::UnsupportedBackend(
            "mongodb (built without the `mongodb` feature)".to_string(),
        ))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
