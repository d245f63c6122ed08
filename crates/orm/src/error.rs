//! Error types for the ORM system
//!
//! Provides error handling for driver operations, model reflection,
//! filter compilation and configuration.

use crate::config::ConfigError;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// The driver does not support the requested operation
    #[error("Not implemented: '{operation}' is not supported by the {driver} driver")]
    NotImplemented {
        operation: &'static str,
        driver: String,
    },

    /// The backend rejected or failed to execute a statement
    #[error("Database error: {0}")]
    Database(String),

    /// The backend connection could not be opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration was missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// An identifier or filter could not be used against the model
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No row matched a lookup that required one
    #[error("Record not found in table '{0}'")]
    NotFound(String),

    /// A statement could not be built from the given input
    #[error("Query error: {0}")]
    Query(String),
}

impl ModelError {
    /// Build a `NotImplemented` error for a driver operation
    pub fn not_implemented(operation: &'static str, driver: impl Into<String>) -> Self {
        ModelError::NotImplemented {
            operation,
            driver: driver.into(),
        }
    }

    /// Whether this error was raised by the backend while executing a statement
    pub fn is_backend_error(&self) -> bool {
        matches!(self, ModelError::Database(_))
    }
}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}
