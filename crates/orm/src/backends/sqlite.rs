//! Embedded SQL Backend Implementation
//!
//! This module provides the SQLite implementation of [`DatabaseDriver`] using
//! sqlx as the underlying database driver. The driver owns exactly one
//! connection for its lifetime; a mutex around it serializes statements.

use std::any::Any;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Row, Sqlite, TypeInfo, ValueRef};
use tokio::sync::Mutex;

use super::core::*;
use super::DatabaseBackendType;
use crate::error::{ModelError, OrmResult};
use crate::fields::{format_datetime, FieldDescriptor, FieldType};
use crate::filter::Comparator;
use crate::sql::{SqlDialect, SqlRenderer, Statement};
use crate::value::DatabaseValue;

/// SQLite flavour of SQL
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn column_type(&self, field_type: FieldType) -> &'static str {
        match field_type {
            FieldType::String => "TEXT",
            FieldType::Boolean => "INTEGER",
            FieldType::Date => "TEXT",
            FieldType::DateTime => "TEXT",
            FieldType::Integer => "INTEGER",
            FieldType::Float => "REAL",
        }
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn auto_increment(&self) -> Option<&'static str> {
        Some("AUTOINCREMENT")
    }

    // SQLite has no ILIKE.
    fn condition(&self, column: &str, comparator: Comparator, placeholder: &str) -> String {
        match comparator {
            Comparator::ILike => format!("lower({}) LIKE lower({})", column, placeholder),
            other => format!("{} {} {}", column, other, placeholder),
        }
    }
}

/// Embedded SQL driver over a single SQLite connection
pub struct SqliteDriver {
    connection: Mutex<Option<SqliteConnection>>,
    target: String,
}

impl std::fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl SqliteDriver {
    /// Open the connection. `target` is a file path (created if missing),
    /// `:memory:`, or a `sqlite:` URL.
    pub async fn connect(target: &str) -> OrmResult<Self> {
        let options = SqliteConnectOptions::from_str(target)
            .map_err(|e| {
                ModelError::Connection(format!("Invalid SQLite target '{}': {}", target, e))
            })?
            .create_if_missing(true);

        let connection = SqliteConnection::connect_with(&options).await.map_err(|e| {
            tracing::error!("Failed to open SQLite database '{}': {}", target, e);
            ModelError::Connection(format!("Failed to open SQLite database '{}': {}", target, e))
        })?;

        tracing::info!("Opened embedded SQL database at '{}'", target);

        Ok(Self {
            connection: Mutex::new(Some(connection)),
            target: target.to_string(),
        })
    }

    /// Connection target this driver was opened with
    pub fn target(&self) -> &str {
        &self.target
    }

    fn renderer(&self) -> SqlRenderer<'static, SqliteDialect> {
        SqlRenderer::new(&SqliteDialect)
    }

    /// Run literal SQL and return the first row
    pub async fn fetch_one_raw(&self, sql: &str) -> OrmResult<Option<DatabaseRow>> {
        self.fetch_optional(Statement {
            sql: sql.to_string(),
            params: Vec::new(),
        })
        .await
    }

    /// Run literal SQL and return every row
    pub async fn fetch_many_raw(&self, sql: &str) -> OrmResult<Vec<DatabaseRow>> {
        self.fetch_all(Statement {
            sql: sql.to_string(),
            params: Vec::new(),
        })
        .await
    }

    /// Run literal SQL and return the affected row count
    pub async fn execute_raw(&self, sql: &str) -> OrmResult<u64> {
        self.execute(Statement {
            sql: sql.to_string(),
            params: Vec::new(),
        })
        .await
    }

    async fn execute(&self, statement: Statement) -> OrmResult<u64> {
        tracing::debug!("Executing: {} ({} params)", statement.sql, statement.params.len());

        let mut guard = self.connection.lock().await;
        let conn = guard.as_mut().ok_or_else(closed_error)?;

        let result = bind_all(sqlx::query(&statement.sql), &statement.params)
            .execute(&mut *conn)
            .await
            .map_err(|e| execution_error(&statement.sql, e))?;

        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, statement: Statement) -> OrmResult<Vec<DatabaseRow>> {
        tracing::debug!("Fetching: {} ({} params)", statement.sql, statement.params.len());

        let mut guard = self.connection.lock().await;
        let conn = guard.as_mut().ok_or_else(closed_error)?;

        let rows = bind_all(sqlx::query(&statement.sql), &statement.params)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| execution_error(&statement.sql, e))?;

        rows.iter().map(sqlite_row_to_database_row).collect()
    }

    async fn fetch_optional(&self, statement: Statement) -> OrmResult<Option<DatabaseRow>> {
        tracing::debug!("Fetching one: {} ({} params)", statement.sql, statement.params.len());

        let mut guard = self.connection.lock().await;
        let conn = guard.as_mut().ok_or_else(closed_error)?;

        let row = bind_all(sqlx::query(&statement.sql), &statement.params)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| execution_error(&statement.sql, e))?;

        row.as_ref().map(sqlite_row_to_database_row).transpose()
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::EmbeddedSql
    }

    async fn create_table(&self, table_name: &str, fields: &[FieldDescriptor]) -> OrmResult<()> {
        let statement = self.renderer().create_table(table_name, fields);
        self.execute(statement).await?;
        Ok(())
    }

    async fn create(&self, table_name: &str, payload: DatabasePayload) -> OrmResult<DatabaseRow> {
        let statement = self.renderer().insert(table_name, payload);
        self.fetch_optional(statement).await?.ok_or_else(|| {
            ModelError::Database(format!("Insert into '{}' returned no row", table_name))
        })
    }

    async fn create_many(
        &self,
        table_name: &str,
        payloads: Vec<DatabasePayload>,
    ) -> OrmResult<Vec<DatabaseRow>> {
        if payloads.is_empty() {
            return Ok(Vec::new());
        }
        let statement = self.renderer().insert_many(table_name, payloads)?;
        self.fetch_all(statement).await
    }

    async fn read_one(
        &self,
        table_name: &str,
        filters: DatabaseFilterGroup,
    ) -> OrmResult<Option<DatabaseRow>> {
        let statement = self.renderer().select(table_name, &filters, Some(1));
        self.fetch_optional(statement).await
    }

    async fn read_many(
        &self,
        table_name: &str,
        filters: DatabaseFilterGroup,
    ) -> OrmResult<Vec<DatabaseRow>> {
        let statement = self.renderer().select(table_name, &filters, None);
        self.fetch_all(statement).await
    }

    async fn update(
        &self,
        table_name: &str,
        filters: DatabaseFilterGroup,
        payload: DatabasePayload,
    ) -> OrmResult<u64> {
        if payload.is_empty() {
            return Ok(0);
        }
        let statement = self.renderer().update(table_name, &filters, payload);
        self.execute(statement).await
    }

    async fn delete(&self, table_name: &str, filters: DatabaseFilterGroup) -> OrmResult<u64> {
        let statement = self.renderer().delete(table_name, &filters);
        self.execute(statement).await
    }

    async fn close(&self) -> OrmResult<()> {
        if let Some(conn) = self.connection.lock().await.take() {
            conn.close().await?;
            tracing::info!("Closed embedded SQL database at '{}'", self.target);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn closed_error() -> ModelError {
    ModelError::Connection("Database connection is closed".to_string())
}

fn execution_error(sql: &str, err: sqlx::Error) -> ModelError {
    tracing::error!("Statement failed: {} ({})", sql, err);
    ModelError::Database(format!("Statement execution failed: {}", err))
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[DatabaseValue],
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = bind_database_value(query, param);
    }
    query
}

/// Bind a DatabaseValue to a sqlx query
fn bind_database_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &DatabaseValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Integer(i) => query.bind(*i),
        DatabaseValue::Float(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
        DatabaseValue::Date(d) => query.bind(d.format("%Y-%m-%d").to_string()),
        DatabaseValue::DateTime(dt) => query.bind(format_datetime(*dt)),
    }
}

fn sqlite_row_to_database_row(row: &SqliteRow) -> OrmResult<DatabaseRow> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());

    for (index, column) in row.columns().iter().enumerate() {
        columns.push(column.name().to_string());
        values.push(sqlite_value_to_database_value(row, index)?);
    }

    Ok(DatabaseRow::new(columns, values))
}

/// Convert a SQLite column value to DatabaseValue by its storage class
fn sqlite_value_to_database_value(row: &SqliteRow, index: usize) -> OrmResult<DatabaseValue> {
    let type_name = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(DatabaseValue::Null);
        }
        raw.type_info().name().to_string()
    };

    match type_name.as_str() {
        "INTEGER" => Ok(DatabaseValue::Integer(row.try_get::<i64, _>(index)?)),
        "REAL" => Ok(DatabaseValue::Float(row.try_get::<f64, _>(index)?)),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get(index)?;
            Ok(DatabaseValue::String(String::from_utf8_lossy(&bytes).into_owned()))
        }
        _ => Ok(DatabaseValue::String(row.try_get::<String, _>(index)?)),
    }
}
