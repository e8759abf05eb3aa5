//! Procedural macros for tablefacade
//!
//! This crate provides `#[derive(TableEntity)]`, which generates the static
//! `TableDescriptor` the metadata resolver reads.

mod attributes;
mod macros;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `TableEntity`
///
/// Generates `TableEntity::table_descriptor()` from the struct's annotations:
///
/// - `#[table_name = "..."]` on the struct, or `#[relational(value = "...", name = "...")]`
/// - `#[column_name = "..."]` on a field, or `#[relational(value = "...")]`
///
/// Every annotated field gets a descriptor entry plus a `set<Field>` writer and a read
/// accessor named `is<Field>` for boolean fields and `get<Field>` otherwise. Fields
/// without a column annotation are left out and need not implement `ValueType`.
///
/// ```ignore
/// use tablefacade::TableEntity;
///
/// #[derive(Debug, Default, Clone, TableEntity)]
/// #[table_name = "sample"]
/// pub struct Sample {
///     #[column_name = "id"]
///     pub id: i32,
///     #[column_name = "flag"]
///     pub flag: bool,
///     #[column_name = "name"]
///     pub name: String,
/// }
/// ```
#[proc_macro_derive(TableEntity, attributes(table_name, column_name, relational))]
pub fn derive_table_entity(input: TokenStream) -> TokenStream {
    macros::derive_table_entity(input)
}
