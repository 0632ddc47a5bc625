use serde::{Deserialize, Serialize};

/// Orchestrator behavior knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Keep generating and persist the answer after the client goes away
    #[serde(default = "default_continue_on_disconnect")]
    pub continue_on_disconnect: bool,
    
    /// Reject a second concurrent send to the same session
    #[serde(default)]
    pub exclusive_sessions: bool,
    
    /// Buffered events per in-flight request
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    
    /// Provider default applies when unset
    #[serde(default)]
    pub temperature: Option<f32>,
    
    /// Provider default applies when unset
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_continue_on_disconnect() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            continue_on_disconnect: default_continue_on_disconnect(),
            exclusive_sessions: false,
            channel_capacity: default_channel_capacity(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl ChatConfig {
    pub fn new() -> Self {
        Self::default()
    }
    
    pub fn continue_on_disconnect(mut self, value: bool) -> Self {
        self.continue_on_disconnect = value;
        self
    }
    
    pub fn exclusive_sessions(mut self, value: bool) -> Self {
        self.exclusive_sessions = value;
        self
    }
    
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: ChatConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ChatConfig::default());
        assert!(config.continue_on_disconnect);
        assert!(!config.exclusive_sessions);
    }
}
