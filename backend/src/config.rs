//! Process configuration
//!
//! Loaded once at start-up from built-in defaults overridden by
//! `EXPENSES_`-prefixed environment variables (e.g. `EXPENSES_PORT=8080`).

use serde::{Deserialize, Serialize};

/// Prefix shared by every configuration environment variable
pub const ENV_PREFIX: &str = "EXPENSES";

/// Deployment mode. Controls how much failure detail leaves the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// sqlx connection URL, e.g. `sqlite:expenses.db`
    pub database_url: String,
    pub environment: Environment,
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
    /// Allowed CORS origin. `*` allows any origin.
    pub allowed_origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_url: "sqlite:expenses.db".to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            allowed_origin: "*".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Build configuration from defaults plus the given environment source
    pub fn from_source(source: config::Environment) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();

        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_url", defaults.database_url)?
            .set_default("environment", "development")?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", "compact")?
            .set_default("allowed_origin", defaults.allowed_origin)?
            .add_source(source.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
