//! Table operations facade.
//!
//! [`TableOperations`] turns entity types and [`Condition`] trees into executor
//! requests: it resolves the type's [`TableMetadata`] through the shared
//! [`MetadataRegistry`], compiles conditions in the executor's dialect and materializes
//! returned rows through the metadata's write accessors.
//!
//! ```
//! use std::sync::Arc;
//! use tablefacade::{Condition, MemoryExecutor, MetadataRegistry, TableEntity, TableOperations};
//!
//! #[derive(Debug, Default, Clone, TableEntity)]
//! #[table_name = "sample"]
//! struct Sample {
//!     #[column_name = "id"]
//!     id: i32,
//!     #[column_name = "flag"]
//!     flag: bool,
//!     #[column_name = "name"]
//!     name: String,
//! }
//!
//! let executor = MemoryExecutor::new();
//! executor.create_table("sample", &["id", "flag", "name"]);
//! let ops = TableOperations::new(executor, Arc::new(MetadataRegistry::new()));
//!
//! ops.insert(&Sample { id: 2, flag: true, name: "Sample".into() })?;
//! let found = ops.find::<Sample>(&Condition::eq("id", 2))?.expect("row");
//! assert_eq!(found.name, "Sample");
//! # Ok::<(), tablefacade::FacadeError>(())
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use crate::condition::{Condition, Predicate, PredicateCompiler};
use crate::error::FacadeError;
use crate::executor::{
    DeleteRequest, InsertRequest, Row, SelectRequest, TableExecutor, UpdateRequest,
};
use crate::metadata::{MetadataRegistry, TableEntity, TableMetadata};
use crate::value::Value;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// CRUD facade over a [`TableExecutor`].
#[derive(Debug)]
pub struct TableOperations<E> {
    executor: E,
    registry: Arc<MetadataRegistry>,
    log_statements: bool,
}

impl<E: TableExecutor> TableOperations<E> {
    pub fn new(executor: E, registry: Arc<MetadataRegistry>) -> Self {
        Self {
            executor,
            registry,
            log_statements: false,
        }
    }

    /// Log every compiled predicate at debug level.
    #[must_use]
    pub fn log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn registry(&self) -> &Arc<MetadataRegistry> {
        &self.registry
    }

    /// Resolved metadata of `T`.
    ///
    /// # Errors
    ///
    /// Returns `FacadeError::Configuration` if `T` cannot be resolved.
    pub fn metadata<T: TableEntity>(&self) -> Result<Arc<TableMetadata<T>>, FacadeError> {
        self.registry.resolve::<T>()
    }

    /// Insert `entity`, skipping null-valued columns so server defaults apply.
    ///
    /// Returns the stored row materialized as `T`, or a clone of `entity` when the
    /// executor does not echo rows.
    ///
    /// # Errors
    ///
    /// Returns `FacadeError::Configuration` for unmapped types, or the executor's error.
    pub fn insert<T: TableEntity>(&self, entity: &T) -> Result<T, FacadeError> {
        let metadata = self.metadata::<T>()?;
        metadata.require_columns()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::operation_span("insert", metadata.table_name()).entered();

        let values: Vec<(String, Value)> = metadata
            .values_of(entity)
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect();
        if self.log_statements {
            log::debug!(
                "insert into {} ({} column(s))",
                metadata.table_name(),
                values.len()
            );
        }

        let echoed = self.executor.insert(&InsertRequest {
            table_name: metadata.table_name(),
            values: &values,
        })?;
        match echoed {
            Some(row) => metadata.materialize(row),
            None => Ok(entity.clone()),
        }
    }

    /// First row matching `condition`, if any.
    ///
    /// No uniqueness is enforced: when several rows match, whichever the executor
    /// yields first is returned.
    ///
    /// # Errors
    ///
    /// Returns configuration, execution or materialization errors.
    pub fn find<T: TableEntity>(&self, condition: &Condition) -> Result<Option<T>, FacadeError> {
        let metadata = self.metadata::<T>()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::operation_span("find", metadata.table_name()).entered();

        let predicate = self.compile(condition, 1)?;
        let rows = self.executor.select(&SelectRequest {
            table_name: metadata.table_name(),
            predicate: Some(&predicate),
        })?;
        rows.into_iter()
            .next()
            .map(|row| metadata.materialize(row))
            .transpose()
    }

    /// Every row of `T`'s table.
    ///
    /// # Errors
    ///
    /// Returns configuration or execution errors; materialization errors surface per
    /// item while iterating.
    pub fn find_all<T: TableEntity>(&self) -> Result<Entities<T>, FacadeError> {
        self.select_entities(None)
    }

    /// Every row matching `condition`.
    ///
    /// # Errors
    ///
    /// As [`TableOperations::find_all`].
    pub fn find_all_where<T: TableEntity>(
        &self,
        condition: &Condition,
    ) -> Result<Entities<T>, FacadeError> {
        self.select_entities(Some(condition))
    }

    /// Set `values` on every row matching `condition`. Returns the affected row count.
    ///
    /// Column names are not checked here; unknown columns and an empty list are
    /// reported by the executor.
    ///
    /// # Errors
    ///
    /// Returns configuration or execution errors.
    pub fn update<T: TableEntity>(
        &self,
        condition: &Condition,
        values: &[(&str, Value)],
    ) -> Result<u64, FacadeError> {
        let metadata = self.metadata::<T>()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::operation_span("update", metadata.table_name()).entered();

        let values: Vec<(String, Value)> = values
            .iter()
            .map(|(column, value)| ((*column).to_string(), value.clone()))
            .collect();
        let predicate = self.compile(condition, values.len() + 1)?;
        Ok(self.executor.update(&UpdateRequest {
            table_name: metadata.table_name(),
            values: &values,
            predicate: &predicate,
        })?)
    }

    /// Delete the rows matching `condition`. Returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns configuration or execution errors.
    pub fn delete<T: TableEntity>(&self, condition: &Condition) -> Result<u64, FacadeError> {
        let predicate = self.compile(condition, 1)?;
        self.delete_matching::<T>(Some(&predicate))
    }

    /// Delete every row of `T`'s table.
    ///
    /// # Errors
    ///
    /// Returns configuration or execution errors.
    pub fn delete_all<T: TableEntity>(&self) -> Result<u64, FacadeError> {
        self.delete_matching::<T>(None)
    }

    /// # Errors
    ///
    /// Returns the executor's error if the lookup fails.
    pub fn exists_table(&self, table_name: &str) -> Result<bool, FacadeError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::operation_span("exists_table", table_name).entered();

        Ok(self.executor.table_exists(table_name)?)
    }

    /// # Errors
    ///
    /// Returns `FacadeError::Execution` wrapping `ExecutionError::DropTableFailed` when
    /// the table does not exist or cannot be dropped.
    pub fn drop_table(&self, table_name: &str) -> Result<(), FacadeError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::operation_span("drop_table", table_name).entered();

        self.executor.drop_table(table_name)?;
        log::info!("Dropped table {table_name}");
        Ok(())
    }

    fn compile(&self, condition: &Condition, first_index: usize) -> Result<Predicate, FacadeError> {
        let predicate = PredicateCompiler::new(self.executor.dialect())
            .starting_at(first_index)
            .compile(condition)?;
        if self.log_statements {
            log::debug!(
                "WHERE {} ({} param(s))",
                predicate.template(),
                predicate.params().len()
            );
        }
        Ok(predicate)
    }

    fn select_entities<T: TableEntity>(
        &self,
        condition: Option<&Condition>,
    ) -> Result<Entities<T>, FacadeError> {
        let metadata = self.metadata::<T>()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::operation_span("find_all", metadata.table_name()).entered();

        let predicate = condition.map(|c| self.compile(c, 1)).transpose()?;
        let rows = self.executor.select(&SelectRequest {
            table_name: metadata.table_name(),
            predicate: predicate.as_ref(),
        })?;
        Ok(Entities::new(metadata, rows))
    }

    fn delete_matching<T: TableEntity>(
        &self,
        predicate: Option<&Predicate>,
    ) -> Result<u64, FacadeError> {
        let metadata = self.metadata::<T>()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::operation_span("delete", metadata.table_name()).entered();

        Ok(self.executor.delete(&DeleteRequest {
            table_name: metadata.table_name(),
            predicate,
        })?)
    }
}

/// Lazily materialized result rows; each `next()` converts one row.
pub struct Entities<T> {
    metadata: Arc<TableMetadata<T>>,
    rows: std::vec::IntoIter<Row>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Entities<T> {
    fn new(metadata: Arc<TableMetadata<T>>, rows: Vec<Row>) -> Self {
        Self {
            metadata,
            rows: rows.into_iter(),
            _entity: PhantomData,
        }
    }
}

impl<T: TableEntity> Iterator for Entities<T> {
    type Item = Result<T, FacadeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|row| self.metadata.materialize(row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<T: TableEntity> ExactSizeIterator for Entities<T> {}

impl<T> std::fmt::Debug for Entities<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entities")
            .field("table", &self.metadata.table_name())
            .field("remaining", &self.rows.len())
            .finish()
    }
}
