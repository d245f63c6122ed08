//! # quill-orm: a minimal ORM
//!
//! Declarative models, boolean filter trees and pluggable storage drivers.
//! Models declare typed fields; the [`Database`] façade compiles payloads and
//! filters against them and hands the result to a [`DatabaseDriver`]. The
//! bundled driver targets an embedded SQLite database.
//!
//! ```no_run
//! use quill_orm::{fields, payload, Database, DatabaseConfig, FieldSet, Filter, Manager, Model};
//!
//! struct User;
//!
//! impl Model for User {
//!     fn model_name() -> &'static str {
//!         "User"
//!     }
//!
//!     fn declare_fields(fields: &mut FieldSet) {
//!         fields
//!             .add("name", fields::char_field(255).not_null())
//!             .add("age", fields::integer_field().not_null());
//!     }
//! }
//!
//! # async fn run() -> quill_orm::OrmResult<()> {
//! let db = Database::connect(DatabaseConfig::embedded("app.db")).await?.shared();
//! let users = Manager::<User>::new(db);
//! users.create_table().await?;
//! users.create(payload! { "name" => "Renan", "age" => 26 }).await?;
//! let adults = users
//!     .filter(Filter::eq("name", "Renan").or(Filter::eq("age", 27)))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod database;
pub mod error;
pub mod fields;
pub mod filter;
pub mod manager;
pub mod model;
pub mod security;
pub mod sql;
pub mod value;

// Re-export core traits and types
pub use backends::{
    DatabaseBackendType, DatabaseDriver, DatabaseFilter, DatabaseFilterGroup, DatabaseFilterNode,
    DatabasePayload, DatabaseRow, SqliteDriver,
};
pub use config::{ConfigError, DatabaseConfig};
pub use database::*;
pub use error::*;
pub use fields::{Field, FieldConstraints, FieldDescriptor, FieldType};
pub use filter::*;
pub use manager::Manager;
pub use model::*;
pub use value::DatabaseValue;
