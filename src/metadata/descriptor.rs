//! Static entity descriptors.
//!
//! A [`TableDescriptor`] is the explicit registration a domain type provides through
//! [`TableEntity`]: which table/column annotations it carries, the declared kind of each
//! field, and a set of named accessor functions. It is normally generated by
//! `#[derive(TableEntity)]`, but can be written by hand:
//!
//! ```rust
//! use tablefacade::{FieldDescriptor, TableDescriptor, TableEntity, ValueType};
//!
//! #[derive(Debug, Default, Clone)]
//! struct Tag {
//!     id: i64,
//!     pinned: bool,
//! }
//!
//! impl TableEntity for Tag {
//!     fn table_descriptor() -> TableDescriptor<Self> {
//!         TableDescriptor::new("Tag")
//!             .table_name("tags")
//!             .field(FieldDescriptor::of::<i64>("id").column_name("id"))
//!             .field(FieldDescriptor::of::<bool>("pinned").column_name("pinned"))
//!             .reader("getId", |t: &Tag| t.id.into_value())
//!             .writer("setId", i64::KIND, |t: &mut Tag, v| {
//!                 t.id = ValueType::try_from_value(v)?;
//!                 Ok(())
//!             })
//!             .reader("isPinned", |t: &Tag| t.pinned.into_value())
//!             .writer("setPinned", bool::KIND, |t: &mut Tag, v| {
//!                 t.pinned = ValueType::try_from_value(v)?;
//!                 Ok(())
//!             })
//!     }
//! }
//! ```

use std::fmt;

use crate::value::{Value, ValueError, ValueKind, ValueType};

/// Reads a field out of an entity.
pub type ReadFn<T> = fn(&T) -> Value;

/// Writes a value into an entity field.
pub type WriteFn<T> = fn(&mut T, Value) -> Result<(), ValueError>;

/// Domain type that can be mapped onto a table.
///
/// `Default` provides the blank instance rows are materialized into; `Clone` lets
/// `insert` hand back the caller's entity when the executor echoes nothing.
pub trait TableEntity: Default + Clone + 'static {
    fn table_descriptor() -> TableDescriptor<Self>;
}

/// Fallback table annotation: `#[relational(value = "...", name = "...")]`.
///
/// A non-empty `value` wins over `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelationalTable {
    pub value: &'static str,
    pub name: &'static str,
}

/// Declared field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: &'static str,
    kind: ValueKind,
    nullable: bool,
    column_name: Option<&'static str>,
    relational_column: Option<&'static str>,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            column_name: None,
            relational_column: None,
        }
    }

    /// Descriptor whose kind and nullability come from the Rust field type `F`.
    pub fn of<F: ValueType>(name: &'static str) -> Self {
        Self::new(name, F::KIND).nullable(F::NULLABLE)
    }

    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Primary column annotation (`#[column_name = "..."]`).
    #[must_use]
    pub fn column_name(mut self, column: &'static str) -> Self {
        self.column_name = Some(column);
        self
    }

    /// Fallback column annotation (`#[relational(value = "...")]`).
    #[must_use]
    pub fn relational_column(mut self, column: &'static str) -> Self {
        self.relational_column = Some(column);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn primary_column(&self) -> Option<&'static str> {
        self.column_name
    }

    pub fn fallback_column(&self) -> Option<&'static str> {
        self.relational_column
    }
}

pub(crate) struct NamedReader<T> {
    pub(crate) name: &'static str,
    pub(crate) read: ReadFn<T>,
}

pub(crate) struct NamedWriter<T> {
    pub(crate) name: &'static str,
    pub(crate) kind: ValueKind,
    pub(crate) write: WriteFn<T>,
}

/// Explicit registration of a domain type.
pub struct TableDescriptor<T> {
    type_name: &'static str,
    table_name: Option<&'static str>,
    relational_table: Option<RelationalTable>,
    fields: Vec<FieldDescriptor>,
    pub(crate) readers: Vec<NamedReader<T>>,
    pub(crate) writers: Vec<NamedWriter<T>>,
}

impl<T> TableDescriptor<T> {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            table_name: None,
            relational_table: None,
            fields: Vec::new(),
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    /// Primary table annotation (`#[table_name = "..."]`).
    #[must_use]
    pub fn table_name(mut self, name: &'static str) -> Self {
        self.table_name = Some(name);
        self
    }

    /// Fallback table annotation (`#[relational(value = "...", name = "...")]`).
    #[must_use]
    pub fn relational_table(mut self, value: &'static str, name: &'static str) -> Self {
        self.relational_table = Some(RelationalTable { value, name });
        self
    }

    /// Declare a field. Declaration order becomes column order.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Register a read accessor (`getX` / `isX`).
    #[must_use]
    pub fn reader(mut self, name: &'static str, read: ReadFn<T>) -> Self {
        self.readers.push(NamedReader { name, read });
        self
    }

    /// Register a write accessor (`setX`) accepting values of `kind`.
    #[must_use]
    pub fn writer(mut self, name: &'static str, kind: ValueKind, write: WriteFn<T>) -> Self {
        self.writers.push(NamedWriter { name, kind, write });
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn primary_table(&self) -> Option<&'static str> {
        self.table_name
    }

    pub fn fallback_table(&self) -> Option<RelationalTable> {
        self.relational_table
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub(crate) fn find_reader(&self, name: &str) -> Option<&NamedReader<T>> {
        self.readers.iter().find(|r| r.name == name)
    }

    pub(crate) fn find_writer(&self, name: &str, kind: ValueKind) -> Option<&NamedWriter<T>> {
        self.writers.iter().find(|w| w.name == name && w.kind == kind)
    }
}

impl<T> fmt::Debug for TableDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableDescriptor")
            .field("type_name", &self.type_name)
            .field("table_name", &self.table_name)
            .field("relational_table", &self.relational_table)
            .field("fields", &self.fields)
            .field("readers", &self.readers.iter().map(|r| r.name).collect::<Vec<_>>())
            .field("writers", &self.writers.iter().map(|w| w.name).collect::<Vec<_>>())
            .finish()
    }
}
