use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::StorageConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins; `"*"` allows any origin.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            max_age: default_cors_max_age(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Connection pool ceiling. Default: 10.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connections kept open while idle. Default: 1.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}

/// Orphan collector configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct GcConfig {
    /// Whether the periodic sweep runs. Default: true.
    #[serde(default = "default_gc_enabled")]
    pub enabled: bool,
    /// Seconds between sweeps. Default: 86400 (daily).
    #[serde(default = "default_gc_interval_secs")]
    pub interval_secs: u64,
    /// Unreferenced images younger than this are left alone. Default: 0.
    #[serde(default)]
    pub min_age_secs: u64,
}

fn default_gc_enabled() -> bool {
    true
}
fn default_gc_interval_secs() -> u64 {
    86_400
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            enabled: default_gc_enabled(),
            interval_secs: default_gc_interval_secs(),
            min_age_secs: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub gc: GcConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("IMAGE_STORE_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite://images.db?mode=rwc")?
            .set_default("storage.root", "./uploads")?
            .set_default("gc.enabled", true)?
            .set_default("gc.interval_secs", 86_400_i64)?
            // Load from config/config.toml
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., IMAGE_STORE__STORAGE__ROOT)
            .add_source(
                Environment::with_prefix("IMAGE_STORE")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("storage.allowed_content_types"),
            )
            .build()?;

        s.try_deserialize()
    }
}
