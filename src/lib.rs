//! # tablefacade
//!
//! CRUD over relational tables with domain structs and composable conditions instead of
//! hand-written query strings.
//!
//! - [`Condition`]: comparison and AND/OR trees, compiled by [`PredicateCompiler`] into
//!   a parameterized [`Predicate`] for a [`Dialect`]
//! - [`TableEntity`] (usually derived) and [`MetadataResolver`]: table name, columns and
//!   accessors of a domain type, cached per type by [`MetadataRegistry`]
//! - [`TableOperations`]: insert, find, find_all, update, delete, table existence and
//!   drop, delegating statements to a [`TableExecutor`]
//!
//! ```no_run
//! use std::sync::Arc;
//! use tablefacade::{connect_from_config, Condition, FacadeConfig, MetadataRegistry, TableEntity, TableOperations};
//!
//! #[derive(Debug, Default, Clone, TableEntity)]
//! #[table_name = "sample"]
//! struct Sample {
//!     #[column_name = "id"]
//!     id: i32,
//!     #[column_name = "flag"]
//!     flag: bool,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FacadeConfig::load()?;
//! let executor = connect_from_config(&config)?;
//! let ops = TableOperations::new(executor, Arc::new(MetadataRegistry::new()))
//!     .log_statements(config.log_statements);
//!
//! let flagged: Vec<Sample> = ops
//!     .find_all_where(&Condition::eq("flag", true))?
//!     .collect::<Result<_, _>>()?;
//! # Ok(())
//! # }
//! ```

pub mod condition;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod metadata;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod operations;
#[cfg(feature = "tracing")]
pub mod tracing_helpers;
pub mod value;

pub use condition::{
    ComparisonCondition, ComparisonOperator, CompositeCondition, CompositeConditionBuilder,
    Condition, Dialect, LogicalOperator, Predicate, PredicateCompiler,
};
pub use config::FacadeConfig;
pub use connection::{connect, connect_from_config, validate_connection_string, ConnectionError};
pub use error::FacadeError;
pub use executor::{
    DeleteRequest, ExecutionError, InsertRequest, MemoryExecutor, PostgresExecutor, Row,
    SelectRequest, TableExecutor, UpdateRequest,
};
pub use metadata::{
    FieldDescriptor, MetadataRegistry, MetadataResolver, ReadAccessor, TableDescriptor,
    TableEntity, TableMetadata, WriteAccessor,
};
pub use operations::{Entities, TableOperations};
pub use value::{Value, ValueError, ValueKind, ValueType};

pub use tablefacade_derive::TableEntity;
