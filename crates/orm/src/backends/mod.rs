//! Database Backend Abstractions
//!
//! The [`DatabaseDriver`] trait separates backend-agnostic query construction
//! from backend-specific statement emission. One driver exists per supported
//! backend; the embedded SQL engine is the only one shipped.

pub mod core;
pub mod sqlite;

use serde::{Deserialize, Serialize};

// Re-export core traits and types
pub use self::core::*;
pub use self::sqlite::SqliteDriver;

/// Supported backend identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseBackendType {
    #[serde(rename = "embedded-sql", alias = "sqlite")]
    EmbeddedSql,
}

impl std::fmt::Display for DatabaseBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseBackendType::EmbeddedSql => write!(f, "embedded-sql"),
        }
    }
}

impl std::str::FromStr for DatabaseBackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "embedded-sql" | "sqlite" => Ok(DatabaseBackendType::EmbeddedSql),
            _ => Err(format!("Unsupported database backend: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_round_trips_through_str() {
        let parsed: DatabaseBackendType = "embedded-sql".parse().unwrap();
        assert_eq!(parsed, DatabaseBackendType::EmbeddedSql);
        assert_eq!(parsed.to_string(), "embedded-sql");
        assert_eq!("SQLite".parse::<DatabaseBackendType>(), Ok(DatabaseBackendType::EmbeddedSql));
        assert!("postgres".parse::<DatabaseBackendType>().is_err());
    }

    #[test]
    fn test_backend_type_serde_alias() {
        let t: DatabaseBackendType = serde_json::from_str("\"sqlite\"").unwrap();
        assert_eq!(t, DatabaseBackendType::EmbeddedSql);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"embedded-sql\"");
    }
}
