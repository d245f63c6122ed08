//! Manager - per-model convenience operations
//!
//! A [`Manager`] binds one model to a shared [`Database`](crate::Database) and
//! exposes the usual shortcuts over the façade.

use std::fmt;
use std::marker::PhantomData;

use crate::backends::DatabaseRow;
use crate::database::SharedDatabase;
use crate::error::{ModelError, OrmResult};
use crate::filter::Filter;
use crate::model::{Model, Payload};

/// Operations scoped to model `M`
pub struct Manager<M: Model> {
    db: SharedDatabase,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Manager<M> {
    pub fn new(db: SharedDatabase) -> Self {
        Self {
            db,
            _model: PhantomData,
        }
    }

    pub fn database(&self) -> &SharedDatabase {
        &self.db
    }

    /// Ensure the model's table exists
    pub async fn create_table(&self) -> OrmResult<()> {
        self.db.create_table_if_missing::<M>().await
    }

    /// Every row of the model's table
    pub async fn all(&self) -> OrmResult<Vec<DatabaseRow>> {
        self.db.read_many::<M>(Filter::empty()).await
    }

    pub async fn filter(&self, filter: impl Into<Filter>) -> OrmResult<Vec<DatabaseRow>> {
        self.db.read_many::<M>(filter).await
    }

    /// First matching row, if any
    pub async fn first(&self, filter: impl Into<Filter>) -> OrmResult<Option<DatabaseRow>> {
        self.db.read_one::<M>(filter).await
    }

    /// First matching row, or [`ModelError::NotFound`]
    pub async fn get(&self, filter: impl Into<Filter>) -> OrmResult<DatabaseRow> {
        self.first(filter)
            .await?
            .ok_or_else(|| ModelError::NotFound(M::table_name()))
    }

    pub async fn create(&self, payload: Payload) -> OrmResult<DatabaseRow> {
        self.db.create::<M>(payload).await
    }

    pub async fn create_many(&self, payloads: Vec<Payload>) -> OrmResult<Vec<DatabaseRow>> {
        self.db.create_many::<M>(payloads).await
    }

    pub async fn update(&self, filter: impl Into<Filter>, payload: Payload) -> OrmResult<u64> {
        self.db.update::<M>(filter, payload).await
    }

    pub async fn delete(&self, filter: impl Into<Filter>) -> OrmResult<u64> {
        self.db.delete::<M>(filter).await
    }
}

impl<M: Model> Clone for Manager<M> {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}

impl<M: Model> fmt::Debug for Manager<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("model", &M::model_name())
            .field("table", &M::table_name())
            .finish()
    }
}
