use config::{Config as ConfigLoader, ConfigBuilder, ConfigError, File};
use config::builder::DefaultState;
use parley_chat::ChatConfig;
use parley_llm::ProviderCredentials;
use parley_persist::StorageBackend;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    
    // Secrets (from ENV only)
    #[serde(skip)]
    pub providers: ProviderCredentials,
    #[serde(skip)]
    pub mongodb_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database: "parley".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Environment variables that override single configuration keys
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("CORS_ENABLED", "cors.enabled"),
    ("STORAGE_BACKEND", "storage.backend"),
    ("STORAGE_DATABASE", "storage.database"),
    ("CHAT_CONTINUE_ON_DISCONNECT", "chat.continue_on_disconnect"),
    ("CHAT_EXCLUSIVE_SESSIONS", "chat.exclusive_sessions"),
    ("CHAT_CHANNEL_CAPACITY", "chat.channel_capacity"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

impl Config {
    /// Load configuration from TOML files and environment variables
    /// 
    /// Hierarchy (weakest to strongest):
    /// 1. Built-in defaults
    /// 2. config/default.toml
    /// 3. config/{ENV}.toml (if ENV is set)
    /// 4. Environment variables (SERVER_, STORAGE_, CHAT_, LOG_ prefixes)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());
        
        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));
        let builder = apply_env_overrides(builder, |name| std::env::var(name).ok())?;
        
        let mut cfg: Config = builder.build()?.try_deserialize()?;
        
        // Secrets come from ENV only, never from TOML
        cfg.providers = ProviderCredentials {
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            openai_base_url: std::env::var("OPENAI_BASE_URL").ok(),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            gemini_base_url: std::env::var("GEMINI_BASE_URL").ok(),
        };
        cfg.mongodb_uri = std::env::var("MONGODB_URI").ok();
        
        if cfg.storage.backend == StorageBackend::Mongodb && cfg.mongodb_uri.is_none() {
            return Err(ConfigError::Message(
                "MONGODB_URI environment variable is required for the mongodb backend".to_string(),
            ));
        }
        
        Ok(cfg)
    }
    
    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder()
            .add_source(File::from(path.as_ref()));
        
        let config = builder.build()?;
        config.try_deserialize()
    }
}

/// Apply every known override that `lookup` resolves
pub fn apply_env_overrides(
    builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    ENV_OVERRIDES
        .iter()
        .try_fold(builder, |builder, (name, key)| {
            builder.set_override_option(*key, lookup(name))
        })
}
