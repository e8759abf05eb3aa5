//! Executor boundary.
//!
//! The facade never talks to a database directly. It compiles conditions, then hands a
//! request (`table name + column values + predicate template + ordered parameters`) to a
//! [`TableExecutor`], which owns statement execution, row streaming, transactions and
//! cancellation. Rows come back as ordered column → value maps ([`Row`]).
//!
//! Two executors ship with the crate:
//!
//! - [`PostgresExecutor`] over a `may_postgres::Client`
//! - [`MemoryExecutor`], an in-process store that evaluates compiled predicates

use std::fmt;
use std::sync::Arc;

use may_postgres::Error as PostgresError;

use crate::condition::{Dialect, Predicate};
use crate::value::Value;

pub mod memory;
pub mod postgres;
pub mod sql;

pub use memory::MemoryExecutor;
pub use postgres::PostgresExecutor;

/// Error reported by an executor.
#[derive(Debug)]
pub enum ExecutionError {
    /// `PostgreSQL` error from `may_postgres`
    PostgresError(PostgresError),
    /// Statement rejected (unknown column, malformed predicate, constraint violation)
    QueryError(String),
    /// Result row could not be decoded
    ParseError(String),
    /// The addressed table does not exist
    TableNotFound(String),
    /// `DROP TABLE` failed
    DropTableFailed { table: String, reason: String },
    /// Other execution errors
    Other(String),
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::PostgresError(e) => write!(f, "PostgreSQL error: {e}"),
            ExecutionError::QueryError(s) => write!(f, "Query error: {s}"),
            ExecutionError::ParseError(s) => write!(f, "Parse error: {s}"),
            ExecutionError::TableNotFound(t) => write!(f, "relation \"{t}\" does not exist"),
            ExecutionError::DropTableFailed { table, reason } => {
                write!(f, "drop table failed for \"{table}\": {reason}")
            }
            ExecutionError::Other(s) => write!(f, "Execution error: {s}"),
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecutionError::PostgresError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PostgresError> for ExecutionError {
    fn from(err: PostgresError) -> Self {
        ExecutionError::PostgresError(err)
    }
}

/// Ordered column → value map of one result row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Row::push`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Append a cell, or replace the value of an existing column in place.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

/// `INSERT` of one row.
#[derive(Debug, Clone, Copy)]
pub struct InsertRequest<'a> {
    pub table_name: &'a str,
    pub values: &'a [(String, Value)],
}

/// `SELECT` of every column, optionally filtered.
#[derive(Debug, Clone, Copy)]
pub struct SelectRequest<'a> {
    pub table_name: &'a str,
    pub predicate: Option<&'a Predicate>,
}

/// `UPDATE ... SET ... WHERE`.
///
/// The predicate's placeholders are numbered after the SET values
/// (`predicate.first_index() == values.len() + 1`).
#[derive(Debug, Clone, Copy)]
pub struct UpdateRequest<'a> {
    pub table_name: &'a str,
    pub values: &'a [(String, Value)],
    pub predicate: &'a Predicate,
}

/// `DELETE`, optionally filtered.
#[derive(Debug, Clone, Copy)]
pub struct DeleteRequest<'a> {
    pub table_name: &'a str,
    pub predicate: Option<&'a Predicate>,
}

/// Turns compiled requests into row operations.
///
/// Implementations must bind `predicate.params()` in order and return rows in the
/// order the store yields them.
pub trait TableExecutor {
    /// Placeholder/quoting convention predicates must be compiled in.
    fn dialect(&self) -> Dialect;

    /// Insert one row. Returns the stored row (with server-assigned values) when the
    /// store can echo it.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError` if the statement fails.
    fn insert(&self, request: &InsertRequest<'_>) -> Result<Option<Row>, ExecutionError>;

    /// # Errors
    ///
    /// Returns `ExecutionError` if the statement fails.
    fn select(&self, request: &SelectRequest<'_>) -> Result<Vec<Row>, ExecutionError>;

    /// Returns the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError` if the statement fails, including unknown columns.
    fn update(&self, request: &UpdateRequest<'_>) -> Result<u64, ExecutionError>;

    /// Returns the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError` if the statement fails.
    fn delete(&self, request: &DeleteRequest<'_>) -> Result<u64, ExecutionError>;

    /// # Errors
    ///
    /// Returns `ExecutionError` if the lookup fails.
    fn table_exists(&self, table_name: &str) -> Result<bool, ExecutionError>;

    /// # Errors
    ///
    /// Returns `ExecutionError::DropTableFailed` when the table does not exist or
    /// cannot be dropped.
    fn drop_table(&self, table_name: &str) -> Result<(), ExecutionError>;
}

impl<E: TableExecutor + ?Sized> TableExecutor for &E {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn insert(&self, request: &InsertRequest<'_>) -> Result<Option<Row>, ExecutionError> {
        (**self).insert(request)
    }

    fn select(&self, request: &SelectRequest<'_>) -> Result<Vec<Row>, ExecutionError> {
        (**self).select(request)
    }

    fn update(&self, request: &UpdateRequest<'_>) -> Result<u64, ExecutionError> {
        (**self).update(request)
    }

    fn delete(&self, request: &DeleteRequest<'_>) -> Result<u64, ExecutionError> {
        (**self).delete(request)
    }

    fn table_exists(&self, table_name: &str) -> Result<bool, ExecutionError> {
        (**self).table_exists(table_name)
    }

    fn drop_table(&self, table_name: &str) -> Result<(), ExecutionError> {
        (**self).drop_table(table_name)
    }
}

impl<E: TableExecutor + ?Sized> TableExecutor for Arc<E> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn insert(&self, request: &InsertRequest<'_>) -> Result<Option<Row>, ExecutionError> {
        (**self).insert(request)
    }

    fn select(&self, request: &SelectRequest<'_>) -> Result<Vec<Row>, ExecutionError> {
        (**self).select(request)
    }

    fn update(&self, request: &UpdateRequest<'_>) -> Result<u64, ExecutionError> {
        (**self).update(request)
    }

    fn delete(&self, request: &DeleteRequest<'_>) -> Result<u64, ExecutionError> {
        (**self).delete(request)
    }

    fn table_exists(&self, table_name: &str) -> Result<bool, ExecutionError> {
        (**self).table_exists(table_name)
    }

    fn drop_table(&self, table_name: &str) -> Result<(), ExecutionError> {
        (**self).drop_table(table_name)
    }
}
