use axum::{extract::State, Json};
use parley_llm::ProviderDescriptor;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::state::AppState;

/// Providers configured at startup, keyed by name
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<String, ProviderDescriptor>> {
    Json(state.registry.descriptors())
}
