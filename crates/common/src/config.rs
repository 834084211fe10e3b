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
    /// Nonce and token configuration.
    pub security: SecurityConfig,
    /// Reaction registry and migration configuration.
    #[serde(default)]
    pub reactions: ReactionsConfig,
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
    /// Public URL of the site, used to build activity permalinks.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`postgres://` or `sqlite:`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// How long a `SQLite` connection waits on a locked database, in
    /// milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

/// Nonce configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Secret used to sign nonces.
    pub nonce_secret: String,
    /// How long a nonce stays valid, in seconds.
    #[serde(default = "default_nonce_lifetime")]
    pub nonce_lifetime_secs: u64,
}

/// Reaction configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReactionsConfig {
    /// Extra reactions registered after the built-in ones.
    #[serde(default)]
    pub custom: Vec<CustomReactionConfig>,
    /// Path to an emoji-data JSON file for the emoji picker.
    #[serde(default)]
    pub emoji_data_path: Option<String>,
    /// Legacy rows handled per migration request.
    #[serde(default = "default_migration_page_size")]
    pub migration_page_size: u64,
}

impl Default for ReactionsConfig {
    fn default() -> Self {
        Self {
            custom: Vec::new(),
            emoji_data_path: None,
            migration_page_size: default_migration_page_size(),
        }
    }
}

/// A reaction declared in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomReactionConfig {
    pub name: String,
    pub emoji: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub can_comment: bool,
    #[serde(default)]
    pub position: i32,
    /// Action string format: `default`, `favorite` or `like`.
    #[serde(default)]
    pub format: Option<String>,
    /// Notification text for a single reactor, `%s` is the reactor's name.
    #[serde(default)]
    pub notification_singular: Option<String>,
    /// Notification text for several reactors.
    #[serde(default)]
    pub notification_plural: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    1
}

const fn default_busy_timeout() -> u64 {
    5_000
}

const fn default_nonce_lifetime() -> u64 {
    86_400
}

const fn default_migration_page_size() -> u64 {
    20
}

impl Config {
    /// Reject settings the service cannot run with.
    fn validated(self) -> Result<Self, config::ConfigError> {
        let url = url::Url::parse(&self.server.url).map_err(|e| {
            config::ConfigError::Message(format!("server.url is not a valid URL: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(config::ConfigError::Message(
                "server.url must be an http or https URL".to_string(),
            ));
        }
        if self.security.nonce_secret.is_empty() {
            return Err(config::ConfigError::Message(
                "security.nonce_secret must not be empty".to_string(),
            ));
        }
        Ok(self)
    }

    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `REACTIONS_ENV`)
    /// 3. Environment variables with `REACTIONS__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let env = std::env::var("REACTIONS_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("REACTIONS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize::<Self>()?.validated()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("REACTIONS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize::<Self>()?.validated()
    }
}
