use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{limit_text, require_text, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl NewUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("username", &self.username, 50)?;
        if let Some(email) = &self.email {
            limit_text("email", email, 100)?;
        }
        if let Some(first) = &self.first_name {
            limit_text("firstName", first, 50)?;
        }
        if let Some(last) = &self.last_name {
            limit_text("lastName", last, 50)?;
        }
        if let Some(url) = &self.profile_image_url {
            limit_text("profileImageUrl", url, 500)?;
        }
        Ok(())
    }

    /// Materialize with a fresh id and timestamps
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: super::new_id(),
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            profile_image_url: self.profile_image_url,
            created_at: now,
            updated_at: now,
        }
    }
}
