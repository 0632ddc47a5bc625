use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
/// 
/// Returns the health status of the API and its dependencies
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut services = HashMap::new();
    
    let storage = match state.store.list_user_sessions("_health_check").await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("Storage health check failed: {}", e);
            "disconnected"
        }
    };
    services.insert(state.store.backend().to_string(), storage.to_string());
    services.insert("providers".to_string(), state.registry.len().to_string());
    
    let status = if storage == "connected" { "healthy" } else { "degraded" };
    
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}
