use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::Message;
use super::validation::{limit_text, require_text, ValidationError};

/// Longest auto-derived session title, marker included
pub const TITLE_MAX_CHARS: usize = 50;
const TITLE_ELLIPSIS: &str = "...";

const TITLE_LIMIT: usize = 200;
const PROVIDER_LIMIT: usize = 50;
const MODEL_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub provider: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Bump `updated_at` without ever moving it backwards
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// Session plus its messages in creation order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionWithMessages {
    #[serde(flatten)]
    pub session: Session,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub user_id: String,
    pub title: String,
    pub provider: String,
    pub model: String,
}

impl NewSession {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("userId", &self.user_id, 64)?;
        limit_text("title", &self.title, TITLE_LIMIT)?;
        require_text("provider", &self.provider, PROVIDER_LIMIT)?;
        limit_text("model", &self.model, MODEL_LIMIT)
    }

    pub fn into_session(self, now: DateTime<Utc>) -> Session {
        Session {
            id: super::new_id(),
            user_id: self.user_id,
            title: self.title,
            provider: self.provider,
            model: self.model,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl SessionUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.provider.is_none() && self.model.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            limit_text("title", title, TITLE_LIMIT)?;
        }
        if let Some(provider) = &self.provider {
            require_text("provider", provider, PROVIDER_LIMIT)?;
        }
        if let Some(model) = &self.model {
            limit_text("model", model, MODEL_LIMIT)?;
        }
        Ok(())
    }

    /// Merge supplied fields and always refresh `updated_at`
    pub fn apply(self, session: &mut Session, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            session.title = title;
        }
        if let Some(provider) = self.provider {
            session.provider = provider;
        }
        if let Some(model) = self.model {
            session.model = model;
        }
        session.touch(now);
    }
}

/// Title for a session derived from its first user message.
///
/// Content up to [`TITLE_MAX_CHARS`] is kept verbatim; longer content is cut
/// so that the result including `...` is exactly `TITLE_MAX_CHARS` long.
pub fn derive_title(content: &str) -> String {
    if content.chars().count() <= TITLE_MAX_CHARS {
        return content.to_string();
    }
    let keep = TITLE_MAX_CHARS - TITLE_ELLIPSIS.chars().count();
    let mut title: String = content.chars().take(keep).collect();
    title.push_str(TITLE_ELLIPSIS);
    title
}
