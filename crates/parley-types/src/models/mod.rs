mod message;
mod session;
mod user;
mod validation;

pub use message::{Message, MessageRole, NewMessage};
pub use session::{derive_title, NewSession, Session, SessionUpdate, SessionWithMessages, TITLE_MAX_CHARS};
pub use user::{NewUser, User};
pub use validation::ValidationError;

/// Fresh opaque identifier for any record
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
