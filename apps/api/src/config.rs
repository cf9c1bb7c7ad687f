//! API configuration module.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables.
//!
//! ## Sources
//! ```text
//! ApiConfig::default()
//!      │
//!      ▼
//! billdesk.toml (or the file named by BILLDESK_CONFIG, which must exist)
//!      │
//!      ▼
//! BILLDESK_<SECTION>__<KEY>   e.g. BILLDESK_SERVER__PORT=9000
//! ```

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

/// Default signing secret. Startup warns when it is still in use.
pub const DEV_JWT_SECRET: &str = "billdesk-dev-secret-change-in-production";

/// API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub billing: BillingConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Returns the `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path
    pub path: String,

    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: "./data/billdesk.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens
    pub jwt_secret: String,

    /// Token lifetime in seconds (default: 8 hours, one shift)
    pub token_lifetime_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_lifetime_secs: 8 * 60 * 60,
        }
    }
}

impl AuthConfig {
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Reject bills whose totals do not add up
    pub verify_totals: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: "billdesk_api=info,billdesk_db=info,tower_http=info".to_string(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from defaults, config file and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match env::var("BILLDESK_CONFIG") {
            Ok(path) => File::with_name(&path).required(true),
            Err(_) => File::with_name("billdesk").required(false),
        };

        let config: ApiConfig = Config::builder()
            .add_source(Config::try_from(&ApiConfig::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("BILLDESK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if self.auth.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.token_lifetime_secs".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
