pub mod config;
pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod phase;

pub use config::ChatConfig;
pub use error::{ChatError, Result};
pub use locks::{SessionGuard, SessionLocks};
pub use orchestrator::{ChatOrchestrator, ChatRun, SendMessage};
pub use phase::ChatPhase;
