use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use parley_types::{Message, MessageRole, Session, User};
use serde::{Deserialize, Serialize};

/// MongoDB user document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// MongoDB session document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSession {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub provider: String,
    pub model: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// MongoDB message document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

// Conversions between storage documents and the shared records

impl From<User> for MongoUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_image_url: user.profile_image_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<MongoUser> for User {
    fn from(user: MongoUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_image_url: user.profile_image_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<Session> for MongoSession {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            title: session.title,
            provider: session.provider,
            model: session.model,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

impl From<MongoSession> for Session {
    fn from(session: MongoSession) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            title: session.title,
            provider: session.provider,
            model: session.model,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

impl From<Message> for MongoMessage {
    fn from(msg: Message) -> Self {
        Self {
            id: msg.id,
            session_id: msg.session_id,
            role: msg.role,
            content: msg.content,
            provider: msg.provider,
            model: msg.model,
            tokens_used: msg.tokens_used.map(i64::from),
            metadata: msg.metadata,
            created_at: msg.created_at,
        }
    }
}

impl From<MongoMessage> for Message {
    fn from(msg: MongoMessage) -> Self {
        Self {
            id: msg.id,
            session_id: msg.session_id,
            role: msg.role,
            content: msg.content,
            provider: msg.provider,
            model: msg.model,
            tokens_used: msg.tokens_used.and_then(|t| u32::try_from(t).ok()),
            metadata: msg.metadata,
            created_at: msg.created_at,
        }
    }
}
