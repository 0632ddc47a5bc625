pub mod builder;
pub mod dbs;
pub mod error;
pub mod trait_client;

pub use builder::{StorageBackend, StoreBuilder};
pub use dbs::memory::InMemoryStore;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoStore;
pub use error::{PersistError, Result};
pub use trait_client::ConversationStore;
