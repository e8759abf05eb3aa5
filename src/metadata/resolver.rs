//! Derives [`TableMetadata`] from a [`TableDescriptor`].
//!
//! Resolution rules:
//!
//! - table name: `#[table_name]` first, then `#[relational]` preferring a non-empty
//!   `value` over `name`;
//! - column name per field: `#[column_name]` first, then `#[relational(value)]`; fields
//!   with neither are not columns;
//! - write accessor `set<Field>` accepting the field's kind; read accessor `is<Field>` for
//!   boolean fields (nullable ones included) and `get<Field>` for everything else.
//!
//! Any missing piece is a `FacadeError::Configuration`; nothing is skipped silently.

use crate::error::FacadeError;
use crate::value::ValueKind;

use super::descriptor::{FieldDescriptor, TableDescriptor, TableEntity};
use super::{ReadAccessor, TableMetadata, WriteAccessor};

/// Upper-case the first character if it is an ASCII letter.
///
/// Locale independent: non-ASCII leading characters are left alone.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(s.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

/// `set<Field>`
pub fn write_accessor_name(field_name: &str) -> String {
    format!("set{}", capitalize_first(field_name))
}

/// `is<Field>` for booleans, `get<Field>` otherwise.
pub fn read_accessor_name(field_name: &str, kind: ValueKind) -> String {
    let prefix = if kind == ValueKind::Bool { "is" } else { "get" };
    format!("{prefix}{}", capitalize_first(field_name))
}

/// Stateless resolver. See the module docs for the rules it applies.
pub struct MetadataResolver;

impl MetadataResolver {
    /// Resolve the metadata of `T` from its descriptor.
    ///
    /// # Errors
    ///
    /// Returns `FacadeError::Configuration` when the type has no usable table name, a
    /// column name is empty or repeated, or an accessor is missing.
    pub fn resolve<T: TableEntity>() -> Result<TableMetadata<T>, FacadeError> {
        Self::resolve_descriptor(&T::table_descriptor())
    }

    /// Resolve metadata from an explicit descriptor.
    ///
    /// # Errors
    ///
    /// Same as [`MetadataResolver::resolve`].
    pub fn resolve_descriptor<T>(
        descriptor: &TableDescriptor<T>,
    ) -> Result<TableMetadata<T>, FacadeError> {
        let table_name = Self::table_name(descriptor)?;

        let mut write_accessors: Vec<(String, WriteAccessor<T>)> = Vec::new();
        let mut read_accessors: Vec<(String, ReadAccessor<T>)> = Vec::new();

        for field in descriptor.fields() {
            let Some(column) = Self::column_name(descriptor, field)? else {
                continue;
            };
            if write_accessors.iter().any(|(c, _)| *c == column) {
                return Err(FacadeError::configuration(format!(
                    "Column '{column}' is mapped twice on {}",
                    descriptor.type_name()
                )));
            }

            let setter_name = write_accessor_name(field.name());
            let setter = descriptor
                .find_writer(&setter_name, field.kind())
                .ok_or_else(|| {
                    FacadeError::configuration(format!(
                        "No set method {setter_name}({}) for field {} on {}",
                        field.kind(),
                        field.name(),
                        descriptor.type_name()
                    ))
                })?;

            let getter_name = read_accessor_name(field.name(), field.kind());
            let getter = descriptor.find_reader(&getter_name).ok_or_else(|| {
                FacadeError::configuration(format!(
                    "No get method {getter_name}() for field {} on {}",
                    field.name(),
                    descriptor.type_name()
                ))
            })?;

            write_accessors.push((
                column.clone(),
                WriteAccessor::new(setter.name, setter.kind, setter.write)
                    .nullable(field.is_nullable()),
            ));
            read_accessors.push((column, ReadAccessor::new(getter.name, getter.read)));
        }

        Ok(TableMetadata::new(table_name, write_accessors, read_accessors))
    }

    fn table_name<T>(descriptor: &TableDescriptor<T>) -> Result<String, FacadeError> {
        let name = if let Some(name) = descriptor.primary_table() {
            name
        } else if let Some(relational) = descriptor.fallback_table() {
            if relational.value.is_empty() {
                relational.name
            } else {
                relational.value
            }
        } else {
            return Err(FacadeError::configuration(format!(
                "Type {} is missing a table_name annotation",
                descriptor.type_name()
            )));
        };
        if name.is_empty() {
            return Err(FacadeError::configuration(format!(
                "Type {} has an empty table name",
                descriptor.type_name()
            )));
        }
        Ok(name.to_string())
    }

    fn column_name<T>(
        descriptor: &TableDescriptor<T>,
        field: &FieldDescriptor,
    ) -> Result<Option<String>, FacadeError> {
        let Some(column) = field.primary_column().or(field.fallback_column()) else {
            return Ok(None);
        };
        if column.is_empty() {
            return Err(FacadeError::configuration(format!(
                "Field {} on {} has an empty column name",
                field.name(),
                descriptor.type_name()
            )));
        }
        Ok(Some(column.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::FieldDescriptor;
    use crate::value::{Value, ValueError, ValueType};

    #[derive(Debug, Default, Clone)]
    struct Sample {
        id: i64,
        flag: bool,
        archived: Option<bool>,
        name: String,
    }

    fn read_id(e: &Sample) -> Value {
        e.id.into_value()
    }
    fn write_id(e: &mut Sample, v: Value) -> Result<(), ValueError> {
        e.id = ValueType::try_from_value(v)?;
        Ok(())
    }
    fn read_flag(e: &Sample) -> Value {
        e.flag.into_value()
    }
    fn write_flag(e: &mut Sample, v: Value) -> Result<(), ValueError> {
        e.flag = ValueType::try_from_value(v)?;
        Ok(())
    }
    fn read_archived(e: &Sample) -> Value {
        e.archived.into_value()
    }
    fn write_archived(e: &mut Sample, v: Value) -> Result<(), ValueError> {
        e.archived = ValueType::try_from_value(v)?;
        Ok(())
    }
    fn read_name(e: &Sample) -> Value {
        e.name.clone().into_value()
    }
    fn write_name(e: &mut Sample, v: Value) -> Result<(), ValueError> {
        e.name = ValueType::try_from_value(v)?;
        Ok(())
    }

    fn accessors(descriptor: TableDescriptor<Sample>) -> TableDescriptor<Sample> {
        descriptor
            .reader("getId", read_id)
            .writer("setId", ValueKind::BigInt, write_id)
            .reader("isFlag", read_flag)
            .writer("setFlag", ValueKind::Bool, write_flag)
            .reader("isArchived", read_archived)
            .writer("setArchived", ValueKind::Bool, write_archived)
            .reader("getName", read_name)
            .writer("setName", ValueKind::String, write_name)
    }

    fn sample_descriptor() -> TableDescriptor<Sample> {
        accessors(
            TableDescriptor::new("Sample")
                .table_name("sample")
                .field(FieldDescriptor::of::<i64>("id").column_name("id"))
                .field(FieldDescriptor::of::<bool>("flag").column_name("flag"))
                .field(FieldDescriptor::of::<Option<bool>>("archived").relational_column("archived"))
                .field(FieldDescriptor::of::<String>("name").column_name("name"))
                .field(FieldDescriptor::of::<String>("scratch")),
        )
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("name"), "Name");
        assert_eq!(capitalize_first("tinyint_field"), "Tinyint_field");
        assert_eq!(capitalize_first("iD"), "ID");
        assert_eq!(capitalize_first("ñame"), "ñame");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_accessor_names_depend_on_kind() {
        assert_eq!(read_accessor_name("flag", ValueKind::Bool), "isFlag");
        assert_eq!(read_accessor_name("name", ValueKind::String), "getName");
        assert_eq!(write_accessor_name("flag"), "setFlag");
    }

    #[test]
    fn test_resolves_columns_in_declaration_order() {
        let metadata = MetadataResolver::resolve_descriptor(&sample_descriptor()).unwrap();
        assert_eq!(metadata.table_name(), "sample");
        assert_eq!(
            metadata.columns().collect::<Vec<_>>(),
            ["id", "flag", "archived", "name"]
        );
    }

    #[test]
    fn test_boolean_fields_use_is_accessors() {
        let metadata = MetadataResolver::resolve_descriptor(&sample_descriptor()).unwrap();
        assert_eq!(metadata.read_accessor("flag").unwrap().name(), "isFlag");
        assert_eq!(metadata.read_accessor("archived").unwrap().name(), "isArchived");
        assert_eq!(metadata.read_accessor("id").unwrap().name(), "getId");
        assert_eq!(metadata.read_accessor("name").unwrap().name(), "getName");
        assert_eq!(metadata.write_accessor("flag").unwrap().name(), "setFlag");
    }

    #[test]
    fn test_unannotated_fields_are_excluded() {
        let metadata = MetadataResolver::resolve_descriptor(&sample_descriptor()).unwrap();
        assert!(metadata.read_accessor("scratch").is_none());
        assert_eq!(metadata.read_accessors().len(), metadata.write_accessors().len());
    }

    #[test]
    fn test_missing_table_annotation() {
        let descriptor: TableDescriptor<Sample> = TableDescriptor::new("Sample");
        let err = MetadataResolver::resolve_descriptor(&descriptor).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("missing a table_name annotation"));
    }

    #[test]
    fn test_primary_table_annotation_wins() {
        let descriptor: TableDescriptor<Sample> = TableDescriptor::new("Sample")
            .relational_table("fallback", "")
            .table_name("primary");
        let metadata = MetadataResolver::resolve_descriptor(&descriptor).unwrap();
        assert_eq!(metadata.table_name(), "primary");
    }

    #[test]
    fn test_relational_value_preferred_over_name() {
        let descriptor: TableDescriptor<Sample> =
            TableDescriptor::new("Sample").relational_table("by_value", "by_name");
        let metadata = MetadataResolver::resolve_descriptor(&descriptor).unwrap();
        assert_eq!(metadata.table_name(), "by_value");

        let descriptor: TableDescriptor<Sample> =
            TableDescriptor::new("Sample").relational_table("", "by_name");
        let metadata = MetadataResolver::resolve_descriptor(&descriptor).unwrap();
        assert_eq!(metadata.table_name(), "by_name");
    }

    #[test]
    fn test_empty_relational_table_fails() {
        let descriptor: TableDescriptor<Sample> = TableDescriptor::new("Sample").relational_table("", "");
        assert!(MetadataResolver::resolve_descriptor(&descriptor)
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_primary_column_wins_over_fallback() {
        let descriptor = accessors(
            TableDescriptor::new("Sample").table_name("sample").field(
                FieldDescriptor::of::<i64>("id")
                    .relational_column("fallback_id")
                    .column_name("primary_id"),
            ),
        );
        let metadata = MetadataResolver::resolve_descriptor(&descriptor).unwrap();
        assert_eq!(metadata.columns().collect::<Vec<_>>(), ["primary_id"]);
    }

    #[test]
    fn test_missing_getter_is_fatal() {
        let descriptor = TableDescriptor::new("Sample")
            .table_name("sample")
            .field(FieldDescriptor::of::<bool>("flag").column_name("flag"))
            // registered under the wrong convention
            .reader("getFlag", read_flag)
            .writer("setFlag", ValueKind::Bool, write_flag);
        let err = MetadataResolver::resolve_descriptor(&descriptor).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("isFlag"));
    }

    #[test]
    fn test_setter_kind_must_match() {
        let descriptor = TableDescriptor::new("Sample")
            .table_name("sample")
            .field(FieldDescriptor::of::<i64>("id").column_name("id"))
            .reader("getId", read_id)
            .writer("setId", ValueKind::String, write_id);
        let err = MetadataResolver::resolve_descriptor(&descriptor).unwrap_err();
        assert!(err.to_string().contains("No set method setId(bigint)"));
    }

    #[test]
    fn test_duplicate_column_fails() {
        let descriptor = accessors(
            TableDescriptor::new("Sample")
                .table_name("sample")
                .field(FieldDescriptor::of::<i64>("id").column_name("dup"))
                .field(FieldDescriptor::of::<String>("name").column_name("dup")),
        );
        assert!(MetadataResolver::resolve_descriptor(&descriptor)
            .unwrap_err()
            .to_string()
            .contains("mapped twice"));
    }

    #[test]
    fn test_empty_column_name_fails() {
        let descriptor = accessors(
            TableDescriptor::new("Sample")
                .table_name("sample")
                .field(FieldDescriptor::of::<i64>("id").column_name("")),
        );
        assert!(MetadataResolver::resolve_descriptor(&descriptor)
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_type_without_columns_resolves_empty() {
        let descriptor: TableDescriptor<Sample> = TableDescriptor::new("Sample")
            .table_name("sample")
            .field(FieldDescriptor::of::<String>("scratch"));
        let metadata = MetadataResolver::resolve_descriptor(&descriptor).unwrap();
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let first = MetadataResolver::resolve_descriptor(&sample_descriptor()).unwrap();
        let second = MetadataResolver::resolve_descriptor(&sample_descriptor()).unwrap();
        assert_eq!(first, second);
    }
}
