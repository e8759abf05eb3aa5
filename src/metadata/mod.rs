//! Entity-to-table metadata.
//!
//! [`TableMetadata`] is the resolved binding between a domain type and its table: the
//! table name plus ordered column → write accessor and column → read accessor mappings.
//! It is produced once per type by [`MetadataResolver`] (usually through the
//! [`MetadataRegistry`] cache) and then applied to every row and entity the facade moves.

use std::fmt;

use crate::error::FacadeError;
use crate::executor::Row;
use crate::value::{Value, ValueError, ValueKind};

pub mod descriptor;
pub mod registry;
pub mod resolver;

pub use descriptor::{FieldDescriptor, ReadFn, RelationalTable, TableDescriptor, TableEntity, WriteFn};
pub use registry::MetadataRegistry;
pub use resolver::MetadataResolver;

/// Resolved read accessor (`getX` / `isX`).
pub struct ReadAccessor<T> {
    name: &'static str,
    read: ReadFn<T>,
}

impl<T> ReadAccessor<T> {
    pub(crate) fn new(name: &'static str, read: ReadFn<T>) -> Self {
        Self { name, read }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn read(&self, entity: &T) -> Value {
        (self.read)(entity)
    }
}

/// Resolved write accessor (`setX`).
pub struct WriteAccessor<T> {
    name: &'static str,
    kind: ValueKind,
    nullable: bool,
    write: WriteFn<T>,
}

impl<T> WriteAccessor<T> {
    pub(crate) fn new(name: &'static str, kind: ValueKind, write: WriteFn<T>) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            write,
        }
    }

    #[must_use]
    pub(crate) fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Kind of value the accessor accepts.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether the field can hold SQL NULL.
    pub fn accepts_null(&self) -> bool {
        self.nullable
    }

    /// Write `value` into `entity`.
    ///
    /// # Errors
    ///
    /// Returns the `ValueError` of a failed conversion.
    pub fn write(&self, entity: &mut T, value: Value) -> Result<(), crate::value::ValueError> {
        (self.write)(entity, value)
    }
}

/// Binding between a domain type and its table.
pub struct TableMetadata<T> {
    table_name: String,
    write_accessors: Vec<(String, WriteAccessor<T>)>,
    read_accessors: Vec<(String, ReadAccessor<T>)>,
}

impl<T> TableMetadata<T> {
    pub(crate) fn new(
        table_name: String,
        write_accessors: Vec<(String, WriteAccessor<T>)>,
        read_accessors: Vec<(String, ReadAccessor<T>)>,
    ) -> Self {
        debug_assert_eq!(write_accessors.len(), read_accessors.len());
        Self {
            table_name,
            write_accessors,
            read_accessors,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Column → write accessor, in field declaration order.
    pub fn write_accessors(&self) -> &[(String, WriteAccessor<T>)] {
        &self.write_accessors
    }

    /// Column → read accessor, in field declaration order.
    pub fn read_accessors(&self) -> &[(String, ReadAccessor<T>)] {
        &self.read_accessors
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.write_accessors.iter().map(|(column, _)| column.as_str())
    }

    pub fn write_accessor(&self, column: &str) -> Option<&WriteAccessor<T>> {
        self.write_accessors
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, accessor)| accessor)
    }

    pub fn read_accessor(&self, column: &str) -> Option<&ReadAccessor<T>> {
        self.read_accessors
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, accessor)| accessor)
    }

    pub fn is_empty(&self) -> bool {
        self.write_accessors.is_empty()
    }

    /// Fail when the type maps no column at all.
    ///
    /// # Errors
    ///
    /// Returns `FacadeError::Configuration` for a type without mapped columns.
    pub fn require_columns(&self) -> Result<(), FacadeError> {
        if self.is_empty() {
            return Err(FacadeError::configuration(format!(
                "Table '{}' has no mapped columns",
                self.table_name
            )));
        }
        Ok(())
    }

    /// Read every mapped column out of `entity`, in column order.
    pub fn values_of(&self, entity: &T) -> Vec<(String, Value)> {
        self.read_accessors
            .iter()
            .map(|(column, accessor)| (column.clone(), accessor.read(entity)))
            .collect()
    }

    /// Write the mapped cells of `row` into `entity`.
    ///
    /// Cells for unmapped columns are ignored; mapped columns missing from the row leave
    /// the field untouched.
    ///
    /// # Errors
    ///
    /// Returns `FacadeError::Materialization` naming the column whose value could not be
    /// converted.
    pub fn apply_row(&self, entity: &mut T, row: Row) -> Result<(), FacadeError> {
        for (column, value) in row {
            let Some(accessor) = self.write_accessor(&column) else {
                continue;
            };
            if value.is_null() && !accessor.accepts_null() {
                return Err(FacadeError::Materialization {
                    column,
                    source: ValueError::NullValue,
                });
            }
            accessor
                .write(entity, value)
                .map_err(|source| FacadeError::Materialization { column, source })?;
        }
        Ok(())
    }

    /// Build a fresh entity from `row`.
    ///
    /// # Errors
    ///
    /// Returns `FacadeError::Configuration` when the type maps no column, or
    /// `FacadeError::Materialization` when a cell does not convert.
    pub fn materialize(&self, row: Row) -> Result<T, FacadeError>
    where
        T: Default,
    {
        self.require_columns()?;
        let mut entity = T::default();
        self.apply_row(&mut entity, row)?;
        Ok(entity)
    }
}

// Equality is by shape: table, column order, accessor names and kinds.
impl<T> PartialEq for TableMetadata<T> {
    fn eq(&self, other: &Self) -> bool {
        self.table_name == other.table_name
            && self.write_accessors.len() == other.write_accessors.len()
            && self.read_accessors.len() == other.read_accessors.len()
            && self
                .write_accessors
                .iter()
                .zip(&other.write_accessors)
                .all(|((ca, a), (cb, b))| ca == cb && a.name == b.name && a.kind == b.kind)
            && self
                .read_accessors
                .iter()
                .zip(&other.read_accessors)
                .all(|((ca, a), (cb, b))| ca == cb && a.name == b.name)
    }
}

impl<T> fmt::Debug for TableMetadata<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableMetadata")
            .field("table_name", &self.table_name)
            .field(
                "write_accessors",
                &self
                    .write_accessors
                    .iter()
                    .map(|(c, a)| (c.as_str(), a.name))
                    .collect::<Vec<_>>(),
            )
            .field(
                "read_accessors",
                &self
                    .read_accessors
                    .iter()
                    .map(|(c, a)| (c.as_str(), a.name))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
