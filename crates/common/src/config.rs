//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// AI helper configuration.
    #[serde(default)]
    pub ai: AiConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Which backend serves the AI helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiProviderKind {
    /// In-process heuristics, no network.
    #[default]
    Local,
    /// Remote model-serving endpoint.
    Http,
}

/// AI helper configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Whether the AI endpoints are served at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Backend selection.
    #[serde(default)]
    pub provider: AiProviderKind,
    /// Base URL of the model server (http provider only).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Bearer token for the model server.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Timeout for a single inference call.
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
    /// How long translations stay cached. Zero disables the cache.
    #[serde(default = "default_ai_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: AiProviderKind::Local,
            endpoint: None,
            api_key: None,
            timeout_secs: default_ai_timeout(),
            cache_ttl_seconds: default_ai_cache_ttl(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

const fn default_ai_timeout() -> u64 {
    15
}

const fn default_ai_cache_ttl() -> u64 {
    3600
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `UNIVERSE_ENV`)
    /// 4. Environment variables with `UNIVERSE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("UNIVERSE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("UNIVERSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("UNIVERSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
