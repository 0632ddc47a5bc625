use parley_types::{ChatEvent, Message, MessageRole};

/// Local view of one session's messages plus the in-progress reply
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    draft: String,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }
    
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            draft: String::new(),
        }
    }
    
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
    
    /// Text streamed so far for the reply being generated
    pub fn draft(&self) -> &str {
        &self.draft
    }
    
    /// Insert a message, replacing any earlier copy with the same id
    pub fn upsert(&mut self, message: Message) {
        match self.messages.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => *existing = message,
            None => self.messages.push(message),
        }
    }
    
    pub fn apply(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::Message { message } => {
                if message.role == MessageRole::Assistant {
                    self.draft.clear();
                }
                self.upsert(message.clone());
            }
            ChatEvent::Token { content } => self.draft.push_str(content),
            ChatEvent::Error { .. } | ChatEvent::Done => self.draft.clear(),
        }
    }
    
    pub fn clear(&mut self) {
        self.messages.clear();
        self.draft.clear();
    }
}
