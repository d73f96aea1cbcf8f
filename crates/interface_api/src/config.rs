//! API configuration

use std::time::Duration;

use core_kernel::CoreError;
use serde::Deserialize;

/// Where the dashboard reads policy data from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayBackend {
    /// The hosted data platform's REST endpoint
    #[default]
    Rest,
    /// The policy tables directly, over a PostgreSQL pool
    Postgres,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Seconds a dashboard session may sit unused before it is evicted
    pub session_idle_secs: u64,
    /// Which gateway implementation serves queries
    pub backend: GatewayBackend,
    /// Data platform project URL, for the REST backend
    pub platform_url: String,
    /// Data platform API key, for the REST backend
    pub platform_api_key: String,
    /// Upstream request timeout in seconds
    pub platform_timeout_secs: u64,
    /// Database URL, for the Postgres backend
    pub database_url: String,
    /// Log level
    pub log_level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            session_idle_secs: 1800,
            backend: GatewayBackend::Rest,
            platform_url: "http://localhost:54321".to_string(),
            platform_api_key: String::new(),
            platform_timeout_secs: 30,
            database_url: "postgres://localhost/policies".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_`-prefixed environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Checks the settings the selected backend depends on
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(CoreError::configuration("jwt_secret must not be empty"));
        }
        if self.jwt_expiration_secs == 0 {
            return Err(CoreError::configuration("jwt_expiration_secs must be positive"));
        }
        if self.session_idle_secs == 0 {
            return Err(CoreError::configuration("session_idle_secs must be positive"));
        }
        match self.backend {
            GatewayBackend::Rest => {
                if self.platform_url.trim().is_empty() {
                    return Err(CoreError::configuration("platform_url is required for the rest backend"));
                }
                if self.platform_api_key.trim().is_empty() {
                    return Err(CoreError::configuration("platform_api_key is required for the rest backend"));
                }
            }
            GatewayBackend::Postgres => {
                if self.database_url.trim().is_empty() {
                    return Err(CoreError::configuration("database_url is required for the postgres backend"));
                }
            }
        }
        Ok(())
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
