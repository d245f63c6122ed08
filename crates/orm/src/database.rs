//! Database Façade - translation from models and filters to driver calls
//!
//! Every operation reflects the model's fields, compiles the caller's payload
//! and/or filter tree against them, and forwards the compiled form to the
//! driver selected by the [`DatabaseConfig`]. Nothing is buffered and no
//! operation spans more than one statement.

use std::sync::Arc;

use crate::backends::{
    DatabaseBackendType, DatabaseDriver, DatabaseFilter, DatabaseFilterGroup, DatabaseFilterNode,
    DatabasePayload, DatabaseRow, SqliteDriver,
};
use crate::config::DatabaseConfig;
use crate::error::{ModelError, ModelResult, OrmResult};
use crate::fields::{FieldDescriptor, FieldType};
use crate::value::DatabaseValue;
use crate::filter::{Filter, FilterGroup, FilterLeaf};
use crate::model::{assignable_fields, reflect_fields, Model, Payload};
use crate::security::validate_identifier;

/// Handle shared by every manager of one database
pub type SharedDatabase = Arc<Database>;

/// Compile raw entry values against a model's fields
///
/// Keys that match no field are dropped. The result follows field order.
pub fn compile_entry(fields: &[FieldDescriptor], mut payload: Payload) -> DatabasePayload {
    let compiled: DatabasePayload = fields
        .iter()
        .filter_map(|field| {
            payload
                .remove(&field.name)
                .map(|raw| (field.name.clone(), field.parse(raw)))
        })
        .collect();

    if !payload.is_empty() {
        let dropped: Vec<&str> = payload.keys().collect();
        tracing::debug!("Dropping payload keys with no matching field: {:?}", dropped);
    }

    compiled
}

/// Compile a filter tree against a model's fields
///
/// Leaf values pass through their field's parser; groups keep their operator.
/// A bare leaf becomes a one-child AND group. Leaves naming an undeclared
/// field are rejected, since dropping them would widen the match.
pub fn compile_filter(fields: &[FieldDescriptor], filter: Filter) -> ModelResult<DatabaseFilterGroup> {
    match filter {
        Filter::Group(group) => compile_group(fields, group),
        Filter::Leaf(leaf) => Ok(DatabaseFilterGroup::new(
            Default::default(),
            vec![compile_leaf(fields, leaf)?],
        )),
    }
}

fn compile_group(fields: &[FieldDescriptor], group: FilterGroup) -> ModelResult<DatabaseFilterGroup> {
    let filters = group
        .children
        .into_iter()
        .map(|child| match child {
            Filter::Leaf(leaf) => compile_leaf(fields, leaf),
            Filter::Group(inner) => compile_group(fields, inner).map(DatabaseFilterNode::Group),
        })
        .collect::<ModelResult<Vec<_>>>()?;

    Ok(DatabaseFilterGroup::new(group.operator, filters))
}

fn compile_leaf(fields: &[FieldDescriptor], leaf: FilterLeaf) -> ModelResult<DatabaseFilterNode> {
    let field = fields
        .iter()
        .find(|f| f.name == leaf.field)
        .ok_or_else(|| ModelError::Validation(format!("Unknown filter field '{}'", leaf.field)))?;

    Ok(DatabaseFilterNode::Condition(DatabaseFilter {
        field: leaf.field,
        comparator: leaf.comparator,
        value: field.parse(leaf.value),
    }))
}

/// Restore stored values to their field's type: booleans come back from
/// storage as integers 0/1
pub fn hydrate_row(fields: &[FieldDescriptor], mut row: DatabaseRow) -> DatabaseRow {
    for field in fields.iter().filter(|f| f.field_type == FieldType::Boolean) {
        row.map_column(&field.name, |value| match value {
            DatabaseValue::Integer(i) => DatabaseValue::Bool(i != 0),
            other => other,
        });
    }
    row
}

fn hydrate_rows(fields: &[FieldDescriptor], rows: Vec<DatabaseRow>) -> Vec<DatabaseRow> {
    rows.into_iter().map(|row| hydrate_row(fields, row)).collect()
}

/// Database façade owning one driver
pub struct Database {
    driver: Box<dyn DatabaseDriver>,
    config: DatabaseConfig,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Build the driver named by `config` and open its connection
    pub async fn connect(config: DatabaseConfig) -> OrmResult<Self> {
        config.validate()?;
        let driver = Self::build_driver(&config).await?;
        Ok(Self { driver, config })
    }

    /// Wrap an already-constructed driver
    pub fn with_driver(driver: Box<dyn DatabaseDriver>, config: DatabaseConfig) -> Self {
        Self { driver, config }
    }

    async fn build_driver(config: &DatabaseConfig) -> OrmResult<Box<dyn DatabaseDriver>> {
        match config.driver {
            DatabaseBackendType::EmbeddedSql => {
                Ok(Box::new(SqliteDriver::connect(&config.connection_target).await?))
            }
        }
    }

    /// Share this façade between managers
    pub fn shared(self) -> SharedDatabase {
        Arc::new(self)
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn driver(&self) -> &dyn DatabaseDriver {
        self.driver.as_ref()
    }

    /// The embedded SQL driver, when that is the configured backend
    pub fn sqlite(&self) -> Option<&SqliteDriver> {
        self.driver.as_any().downcast_ref::<SqliteDriver>()
    }

    /// Create the model's table unless it exists; existing columns are never altered
    pub async fn create_table_if_missing<M: Model>(&self) -> OrmResult<()> {
        let table = M::table_name();
        let fields = reflect_fields::<M>();

        validate_identifier(&table)?;
        for field in &fields {
            validate_identifier(&field.name)?;
        }

        tracing::debug!("Ensuring table '{}' with {} columns", table, fields.len());
        self.driver.create_table(&table, &fields).await
    }

    /// Insert one entry and return the stored row, including its `id`
    pub async fn create<M: Model>(&self, payload: Payload) -> OrmResult<DatabaseRow> {
        let values = compile_entry(&assignable_fields::<M>(), payload);
        let row = self.driver.create(&M::table_name(), values).await?;
        Ok(hydrate_row(&reflect_fields::<M>(), row))
    }

    /// Insert several entries with one statement
    pub async fn create_many<M: Model>(&self, payloads: Vec<Payload>) -> OrmResult<Vec<DatabaseRow>> {
        if payloads.is_empty() {
            return Ok(Vec::new());
        }
        let fields = assignable_fields::<M>();
        let rows = payloads
            .into_iter()
            .map(|payload| compile_entry(&fields, payload))
            .collect();
        let stored = self.driver.create_many(&M::table_name(), rows).await?;
        Ok(hydrate_rows(&reflect_fields::<M>(), stored))
    }

    /// First row matching `filter`
    pub async fn read_one<M: Model>(&self, filter: impl Into<Filter>) -> OrmResult<Option<DatabaseRow>> {
        let fields = reflect_fields::<M>();
        let filters = compile_filter(&fields, filter.into())?;
        let row = self.driver.read_one(&M::table_name(), filters).await?;
        Ok(row.map(|row| hydrate_row(&fields, row)))
    }

    /// Every row matching `filter`; an empty filter matches all rows
    pub async fn read_many<M: Model>(&self, filter: impl Into<Filter>) -> OrmResult<Vec<DatabaseRow>> {
        let fields = reflect_fields::<M>();
        let filters = compile_filter(&fields, filter.into())?;
        let rows = self.driver.read_many(&M::table_name(), filters).await?;
        Ok(hydrate_rows(&fields, rows))
    }

    /// Apply `payload` to every row matching `filter`
    pub async fn update<M: Model>(&self, filter: impl Into<Filter>, payload: Payload) -> OrmResult<u64> {
        let filters = compile_filter(&reflect_fields::<M>(), filter.into())?;
        let values = compile_entry(&assignable_fields::<M>(), payload);
        self.driver.update(&M::table_name(), filters, values).await
    }

    /// Delete every row matching `filter`
    pub async fn delete<M: Model>(&self, filter: impl Into<Filter>) -> OrmResult<u64> {
        let filters = compile_filter(&reflect_fields::<M>(), filter.into())?;
        self.driver.delete(&M::table_name(), filters).await
    }

    /// Close the driver's connection
    pub async fn close(&self) -> OrmResult<()> {
        self.driver.close().await
    }
}
