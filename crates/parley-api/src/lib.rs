pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::CorsConfig;
use crate::handlers::stream;
use crate::middleware::logging;
use crate::routes::{health, messages, providers, sessions, users};
use crate::state::AppState;

/// Upper bound on time to response headers
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/providers", get(providers::list_providers))
        .route("/user", get(users::get_user))
        .route(
            "/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route(
            "/sessions/:session_id",
            get(sessions::get_session)
                .patch(sessions::update_session)
                .delete(sessions::delete_session),
        )
        .route(
            "/sessions/:session_id/messages",
            get(messages::list_messages).post(stream::send_message_stream),
        );
    
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(build_cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.enabled {
        let mut cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PATCH,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);
        
        if config.origins.iter().any(|o| o == "*") {
            cors = cors.allow_origin(Any);
        } else {
            let origins: Vec<axum::http::HeaderValue> = config
                .origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            cors = cors.allow_origin(origins);
        }
        
        cors
    } else {
        CorsLayer::permissive()
    }
}
