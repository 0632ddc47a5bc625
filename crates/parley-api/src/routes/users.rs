use axum::{extract::State, Json};
use parley_types::{NewUser, User};
use std::sync::Arc;

use crate::{error::ApiResult, state::AppState};

pub const DEMO_USERNAME: &str = "demo_user";
const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_FIRST_NAME: &str = "Demo";
const DEMO_LAST_NAME: &str = "User";
const DEMO_AVATAR_URL: &str =
    "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=150&h=150&fit=crop&crop=face";

fn demo_profile() -> NewUser {
    NewUser {
        username: DEMO_USERNAME.to_string(),
        email: Some(DEMO_EMAIL.to_string()),
        first_name: Some(DEMO_FIRST_NAME.to_string()),
        last_name: Some(DEMO_LAST_NAME.to_string()),
        profile_image_url: Some(DEMO_AVATAR_URL.to_string()),
    }
}

/// The single demo identity, created on first use
pub async fn demo_user(state: &AppState) -> ApiResult<User> {
    Ok(state.store.ensure_user(demo_profile()).await?)
}

pub async fn get_user(State(state): State<Arc<AppState>>) -> ApiResult<Json<User>> {
    Ok(Json(demo_user(&state).await?))
}
