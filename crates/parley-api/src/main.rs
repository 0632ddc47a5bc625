use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley_api::{build_router, config::Config, state::AppState};
use parley_llm::ProviderRegistry;
use parley_persist::StoreBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();
    
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    
    init_logging(&config);
    
    tracing::info!("Starting Parley API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);
    
    // Provider registry is fixed from here on
    let registry = ProviderRegistry::from_credentials(&config.providers)?;
    if registry.is_empty() {
        tracing::warn!("No provider credentials configured; chat requests will be rejected");
    } else {
        tracing::info!(providers = ?registry.names(), "Providers registered");
    }
    
    let mut store_builder = StoreBuilder::new()
        .backend(config.storage.backend)
        .database(&config.storage.database);
    if let Some(uri) = &config.mongodb_uri {
        store_builder = store_builder.mongodb_uri(uri);
    }
    let store = store_builder.build().await?;
    tracing::info!(backend = store.backend(), "Storage ready");
    
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, store, registry));
    let app = build_router(state);
    
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    
    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;
    
    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    
    let registry = tracing_subscriber::registry().with(env_filter);
    
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
