//! Database configuration
//!
//! The façade is built from a [`DatabaseConfig`]: which backend to use and the
//! backend-specific connection target (for the embedded SQL backend, a file
//! path, `:memory:` or a `sqlite:` URL).

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backends::DatabaseBackendType;

/// Environment variable naming the backend
pub const DRIVER_ENV_VAR: &str = "DATABASE_DRIVER";

/// Environment variable holding the connection target
pub const URL_ENV_VAR: &str = "DATABASE_URL";

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },
}

/// Configuration record consumed when constructing the database façade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub driver: DatabaseBackendType,
    pub connection_target: String,
}

impl DatabaseConfig {
    pub fn new(driver: DatabaseBackendType, connection_target: impl Into<String>) -> Self {
        Self {
            driver,
            connection_target: connection_target.into(),
        }
    }

    /// Embedded SQL database at `connection_target`
    pub fn embedded(connection_target: impl Into<String>) -> Self {
        Self::new(DatabaseBackendType::EmbeddedSql, connection_target)
    }

    /// Embedded SQL database living only as long as the connection
    pub fn in_memory() -> Self {
        Self::embedded(":memory:")
    }

    /// Load configuration from `DATABASE_DRIVER` (default `embedded-sql`) and
    /// `DATABASE_URL` (required)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let driver = get_or_default(&lookup, DRIVER_ENV_VAR, "embedded-sql");
        let driver = DatabaseBackendType::from_str(&driver).map_err(|_| ConfigError::InvalidValue {
            field: "driver".to_string(),
            value: driver.clone(),
            expected: "embedded-sql".to_string(),
        })?;

        let connection_target = get_required(&lookup, URL_ENV_VAR)?;

        let config = Self {
            driver,
            connection_target,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection_target.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "connection_target".to_string(),
                reason: "Connection target cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn get_or_default<F>(lookup: &F, var: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var).unwrap_or_else(|| default.to_string())
}

fn get_required<F>(lookup: &F, var: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var).ok_or_else(|| ConfigError::MissingEnvVar {
        var: var.to_string(),
    })
}
