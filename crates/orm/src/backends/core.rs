//! Core Database Driver Traits
//!
//! This module defines the driver contract and the backend-facing data the
//! database façade hands to it: compiled payloads, compiled filter groups and
//! result rows. Drivers own their physical connection and are responsible for
//! type mapping, constraint rendering and predicate rendering.

use std::any::Any;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::backends::DatabaseBackendType;
use crate::error::{ModelError, OrmResult};
use crate::fields::FieldDescriptor;
use crate::filter::{Comparator, FilterOperator};
use crate::value::DatabaseValue;

/// Compiled entry values, in model field order
pub type DatabasePayload = Vec<(String, DatabaseValue)>;

/// Compiled leaf constraint with a backend-ready value
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseFilter {
    pub field: String,
    pub comparator: Comparator,
    pub value: DatabaseValue,
}

/// Node of a compiled filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseFilterNode {
    Condition(DatabaseFilter),
    Group(DatabaseFilterGroup),
}

/// Compiled filter group; an empty group places no restriction on rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseFilterGroup {
    pub operator: FilterOperator,
    pub filters: Vec<DatabaseFilterNode>,
}

impl DatabaseFilterGroup {
    pub fn new(operator: FilterOperator, filters: Vec<DatabaseFilterNode>) -> Self {
        Self { operator, filters }
    }

    /// Group matching every row
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// A result row: column names with their values, in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseRow {
    columns: Vec<String>,
    values: Vec<DatabaseValue>,
}

impl DatabaseRow {
    pub fn new(columns: Vec<String>, values: Vec<DatabaseValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Get a column value by index
    pub fn get_by_index(&self, index: usize) -> Option<&DatabaseValue> {
        self.values.get(index)
    }

    /// Get a column value by name
    pub fn get_by_name(&self, name: &str) -> Option<&DatabaseValue> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i))
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Replace the value of column `name` with `f` applied to it
    pub fn map_column<F>(&mut self, name: &str, f: F)
    where
        F: FnOnce(DatabaseValue) -> DatabaseValue,
    {
        let index = self.columns.iter().position(|c| c == name);
        if let Some(slot) = index.and_then(|i| self.values.get_mut(i)) {
            let value = std::mem::replace(slot, DatabaseValue::Null);
            *slot = f(value);
        }
    }

    /// System-assigned identifier of the row, if selected
    pub fn id(&self) -> Option<i64> {
        self.get_by_name("id").and_then(DatabaseValue::as_i64)
    }

    /// Get a typed value from a column
    pub fn get<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let value = self
            .get_by_name(column)
            .ok_or_else(|| ModelError::Query(format!("Column '{}' not found", column)))?;

        serde_json::from_value(value.to_json()).map_err(|e| {
            ModelError::Serialization(format!("Failed to deserialize column '{}': {}", column, e))
        })
    }

    /// Get an optional typed value; missing columns and NULL give `None`
    pub fn try_get<T>(&self, column: &str) -> OrmResult<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        match self.get_by_name(column) {
            None | Some(DatabaseValue::Null) => Ok(None),
            Some(_) => self.get(column).map(Some),
        }
    }

    /// Convert row to a JSON object
    pub fn to_json(&self) -> JsonValue {
        let map = self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(c, v)| (c.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        JsonValue::Object(map)
    }

    /// Convert row to HashMap
    pub fn to_map(&self) -> HashMap<String, DatabaseValue> {
        self.columns
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }

    /// Hydrate the whole row into a caller type
    pub fn deserialize<T>(&self) -> OrmResult<T>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        serde_json::from_value(self.to_json()).map_err(|e| {
            ModelError::Serialization(format!("Failed to deserialize row: {}", e))
        })
    }
}

/// Backend driver contract
///
/// Every operation has a default body returning [`ModelError::NotImplemented`],
/// so a driver only overrides what its backend supports.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Backend this driver talks to
    fn backend_type(&self) -> DatabaseBackendType;

    /// Create the table unless it already exists; existing tables are left untouched
    async fn create_table(&self, table_name: &str, fields: &[FieldDescriptor]) -> OrmResult<()> {
        let _ = (table_name, fields);
        Err(ModelError::not_implemented("create_table", self.backend_type().to_string()))
    }

    /// Insert one row and return it as stored
    async fn create(&self, table_name: &str, payload: DatabasePayload) -> OrmResult<DatabaseRow> {
        let _ = (table_name, payload);
        Err(ModelError::not_implemented("create", self.backend_type().to_string()))
    }

    /// Insert several rows with one statement and return them as stored
    async fn create_many(
        &self,
        table_name: &str,
        payloads: Vec<DatabasePayload>,
    ) -> OrmResult<Vec<DatabaseRow>> {
        let _ = (table_name, payloads);
        Err(ModelError::not_implemented("create_many", self.backend_type().to_string()))
    }

    /// First row matching the filter group
    async fn read_one(
        &self,
        table_name: &str,
        filters: DatabaseFilterGroup,
    ) -> OrmResult<Option<DatabaseRow>> {
        let _ = (table_name, filters);
        Err(ModelError::not_implemented("read_one", self.backend_type().to_string()))
    }

    /// Every row matching the filter group
    async fn read_many(
        &self,
        table_name: &str,
        filters: DatabaseFilterGroup,
    ) -> OrmResult<Vec<DatabaseRow>> {
        let _ = (table_name, filters);
        Err(ModelError::not_implemented("read_many", self.backend_type().to_string()))
    }

    /// Update matching rows, returning the affected row count
    async fn update(
        &self,
        table_name: &str,
        filters: DatabaseFilterGroup,
        payload: DatabasePayload,
    ) -> OrmResult<u64> {
        let _ = (table_name, filters, payload);
        Err(ModelError::not_implemented("update", self.backend_type().to_string()))
    }

    /// Delete matching rows, returning the affected row count
    async fn delete(&self, table_name: &str, filters: DatabaseFilterGroup) -> OrmResult<u64> {
        let _ = (table_name, filters);
        Err(ModelError::not_implemented("delete", self.backend_type().to_string()))
    }

    /// Close the underlying connection
    async fn close(&self) -> OrmResult<()> {
        Ok(())
    }

    /// Downcasting support for backend-specific access
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    struct ReadOnlyDriver;

    #[async_trait]
    impl DatabaseDriver for ReadOnlyDriver {
        fn backend_type(&self) -> DatabaseBackendType {
            DatabaseBackendType::EmbeddedSql
        }

        async fn read_many(
            &self,
            _table_name: &str,
            _filters: DatabaseFilterGroup,
        ) -> OrmResult<Vec<DatabaseRow>> {
            Ok(Vec::new())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn sample_row() -> DatabaseRow {
        DatabaseRow::new(
            vec!["id".into(), "name".into(), "age".into(), "nickname".into()],
            vec![
                DatabaseValue::Integer(1),
                DatabaseValue::from("Renan"),
                DatabaseValue::Integer(26),
                DatabaseValue::Null,
            ],
        )
    }

    #[tokio::test]
    async fn test_unimplemented_operations_signal_not_implemented() {
        let driver = ReadOnlyDriver;
        assert!(driver.read_many("user", DatabaseFilterGroup::all()).await.is_ok());

        let err = driver.delete("user", DatabaseFilterGroup::all()).await.unwrap_err();
        assert!(matches!(
            err,
            ModelError::NotImplemented { operation: "delete", .. }
        ));

        let err = driver.create_table("user", &[]).await.unwrap_err();
        assert!(matches!(err, ModelError::NotImplemented { .. }));
    }

    #[test]
    fn test_row_typed_access() {
        let row = sample_row();
        assert_eq!(row.id(), Some(1));
        assert_eq!(row.get::<String>("name").unwrap(), "Renan");
        assert_eq!(row.get::<i64>("age").unwrap(), 26);
        assert_eq!(row.try_get::<String>("nickname").unwrap(), None);
        assert_eq!(row.try_get::<String>("missing").unwrap(), None);
        assert!(row.get::<String>("missing").is_err());
        assert!(row.get::<i64>("name").is_err());
    }

    #[test]
    fn test_row_deserialize() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: i64,
            name: String,
            age: i32,
        }

        let user: User = sample_row().deserialize().unwrap();
        assert_eq!(
            user,
            User {
                id: 1,
                name: "Renan".into(),
                age: 26
            }
        );
    }

    #[test]
    fn test_empty_group_matches_all() {
        assert!(DatabaseFilterGroup::all().is_empty());
        assert_eq!(DatabaseFilterGroup::all().operator, FilterOperator::And);
    }
}
