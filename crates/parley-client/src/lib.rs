pub mod api;
pub mod conversation;
pub mod error;
pub mod session;

pub use api::{ApiClient, ChatEventStream};
pub use conversation::Conversation;
pub use error::{ClientError, Result};
pub use session::{ChatSession, SendOutcome, SessionState};
