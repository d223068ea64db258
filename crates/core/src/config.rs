//! Configuration loading for storefront services
//!
//! All configuration is read from environment variables with the
//! `STOREFRONT_` prefix, with `.env` file support via dotenvy. The override
//! hierarchy is: defaults < .env < environment.

use crate::error::StorefrontError;
use std::time::Duration;

/// Load a `.env` file if present. Missing files are not an error.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Standardized environment-variable configuration loading
pub trait ConfigLoader: Sized {
    /// Load configuration from `STOREFRONT_`-prefixed environment variables
    fn from_env() -> Result<Self, StorefrontError>;

    /// Validate configuration values
    fn validate(&self) -> Result<(), StorefrontError>;
}

/// Read an environment variable, treating empty values as unset
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Parse an environment variable, falling back to `default` when unset
pub fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, StorefrontError> {
    match env_var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| StorefrontError::config(format!("cannot parse {name}={raw}"))),
        None => Ok(default),
    }
}

/// PostgreSQL connection configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/storefront".to_string(),
            max_connections: 20,
            min_connections: 2,
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl ConfigLoader for DatabaseConfig {
    fn from_env() -> Result<Self, StorefrontError> {
        let defaults = Self::default();
        let config = Self {
            database_url: env_var("STOREFRONT_DATABASE_URL")
                .or_else(|| env_var("DATABASE_URL"))
                .unwrap_or(defaults.database_url),
            max_connections: env_parse(
                "STOREFRONT_DATABASE_MAX_CONNECTIONS",
                defaults.max_connections,
            )?,
            min_connections: env_parse(
                "STOREFRONT_DATABASE_MIN_CONNECTIONS",
                defaults.min_connections,
            )?,
            idle_timeout: Duration::from_secs(env_parse(
                "STOREFRONT_DATABASE_IDLE_TIMEOUT",
                defaults.idle_timeout.as_secs(),
            )?),
            acquire_timeout: Duration::from_secs(env_parse(
                "STOREFRONT_DATABASE_ACQUIRE_TIMEOUT",
                defaults.acquire_timeout.as_secs(),
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), StorefrontError> {
        if !self.database_url.starts_with("postgres") {
            return Err(StorefrontError::config(
                "database URL must be a postgres:// or postgresql:// URL",
            ));
        }
        if self.max_connections == 0 {
            return Err(StorefrontError::config("max_connections must be positive"));
        }
        if self.min_connections > self.max_connections {
            return Err(StorefrontError::config(
                "min_connections cannot exceed max_connections",
            ));
        }
        Ok(())
    }
}

/// HTTP serving configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8085,
            workers: None,
        }
    }
}

impl ConfigLoader for ServiceConfig {
    fn from_env() -> Result<Self, StorefrontError> {
        let defaults = Self::default();
        let config = Self {
            host: env_var("STOREFRONT_HOST").unwrap_or(defaults.host),
            port: env_parse("STOREFRONT_PORT", defaults.port)?,
            workers: match env_var("STOREFRONT_WORKERS") {
                Some(raw) => Some(raw.parse().map_err(|_| {
                    StorefrontError::config(format!("cannot parse STOREFRONT_WORKERS={raw}"))
                })?),
                None => defaults.workers,
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), StorefrontError> {
        if self.host.is_empty() {
            return Err(StorefrontError::config("host cannot be empty"));
        }
        if self.port == 0 {
            return Err(StorefrontError::config("port cannot be 0"));
        }
        Ok(())
    }
}
