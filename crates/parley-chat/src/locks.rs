use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// In-flight markers for sessions with a running generation
#[derive(Clone, Default)]
pub struct SessionLocks {
    active: Arc<Mutex<HashSet<String>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Mark `session_id` busy; `None` if it already is
    pub fn try_acquire(&self, session_id: &str) -> Option<SessionGuard> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(session_id.to_string()) {
            return None;
        }
        Some(SessionGuard {
            locks: self.clone(),
            session_id: session_id.to_string(),
        })
    }
    
    pub fn is_busy(&self, session_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(session_id)
    }
}

/// Releases the session on drop
pub struct SessionGuard {
    locks: SessionLocks,
    session_id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.locks
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.session_id);
    }
}
