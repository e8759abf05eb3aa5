//! Descriptor generation tests for `#[derive(TableEntity)]`.

use tablefacade::{MetadataResolver, TableEntity, Value, ValueKind};

#[derive(Debug, Default, Clone, PartialEq, TableEntity)]
#[table_name = "sample"]
struct Sample {
    #[column_name = "id"]
    id: i32,
    #[column_name = "flag"]
    flag: bool,
    #[column_name = "name"]
    name: String,
    // not a column, and not a ValueType either
    cache: Vec<String>,
}

#[derive(Debug, Default, Clone, TableEntity)]
#[relational(value = "accounts", name = "ignored")]
struct Account {
    #[relational(value = "account_id")]
    id: i64,
    #[column_name = "is_active"]
    #[relational(value = "shadowed")]
    active: Option<bool>,
    #[relational(name = "created")]
    created_at: Option<chrono::NaiveDateTime>,
    #[column_name = "external_ref"]
    external: uuid::Uuid,
}

#[derive(Debug, Default, Clone, TableEntity)]
#[relational(value = "", name = "fallback_name")]
struct NamedFallback {
    #[column_name = "id"]
    id: i32,
}

#[derive(Debug, Default, Clone, TableEntity)]
struct Unannotated {
    #[column_name = "id"]
    id: i32,
}

#[derive(Debug, Default, Clone, TableEntity)]
#[table_name = "keywords"]
struct Keywords {
    #[column_name = "type"]
    r#type: String,
}

#[test]
fn test_descriptor_lists_only_annotated_fields() {
    let descriptor = Sample::table_descriptor();
    assert_eq!(descriptor.type_name(), "Sample");
    assert_eq!(descriptor.primary_table(), Some("sample"));
    let names: Vec<_> = descriptor.fields().iter().map(|f| f.name()).collect();
    assert_eq!(names, ["id", "flag", "name"]);
    let kinds: Vec<_> = descriptor.fields().iter().map(|f| f.kind()).collect();
    assert_eq!(kinds, [ValueKind::Int, ValueKind::Bool, ValueKind::String]);
}

#[test]
fn test_generated_accessors_resolve() {
    let metadata = MetadataResolver::resolve::<Sample>().expect("resolves");
    assert_eq!(metadata.table_name(), "sample");
    assert_eq!(metadata.columns().collect::<Vec<_>>(), ["id", "flag", "name"]);

    let readers: Vec<_> = metadata
        .read_accessors()
        .iter()
        .map(|(_, accessor)| accessor.name())
        .collect();
    assert_eq!(readers, ["getId", "isFlag", "getName"]);
    let writers: Vec<_> = metadata
        .write_accessors()
        .iter()
        .map(|(_, accessor)| accessor.name())
        .collect();
    assert_eq!(writers, ["setId", "setFlag", "setName"]);
}

#[test]
fn test_generated_accessors_move_values() {
    let metadata = MetadataResolver::resolve::<Sample>().expect("resolves");
    let sample = Sample {
        id: 2,
        flag: true,
        name: "Sample".to_string(),
        cache: vec!["x".to_string()],
    };
    assert_eq!(
        metadata.values_of(&sample),
        vec![
            ("id".to_string(), Value::Int(2)),
            ("flag".to_string(), Value::Bool(true)),
            ("name".to_string(), Value::from("Sample")),
        ]
    );

    let mut blank = Sample::default();
    metadata
        .write_accessor("name")
        .expect("name column")
        .write(&mut blank, Value::from("Written"))
        .expect("write");
    assert_eq!(blank.name, "Written");
}

#[test]
fn test_relational_fallbacks() {
    let metadata = MetadataResolver::resolve::<Account>().expect("resolves");
    assert_eq!(metadata.table_name(), "accounts");
    assert_eq!(
        metadata.columns().collect::<Vec<_>>(),
        ["account_id", "is_active", "created", "external_ref"]
    );
    // Option<bool> still reads through `is`
    assert_eq!(
        metadata.read_accessor("is_active").expect("column").name(),
        "isActive"
    );
    assert_eq!(
        metadata.read_accessor("created").expect("column").name(),
        "getCreatedAt"
    );

    let fallback = MetadataResolver::resolve::<NamedFallback>().expect("resolves");
    assert_eq!(fallback.table_name(), "fallback_name");
}

#[test]
fn test_missing_table_annotation_fails_resolution() {
    let err = MetadataResolver::resolve::<Unannotated>().unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("Unannotated"));
}

#[test]
fn test_raw_identifier_fields() {
    let metadata = MetadataResolver::resolve::<Keywords>().expect("resolves");
    assert_eq!(
        metadata.read_accessor("type").expect("column").name(),
        "getType"
    );
}

#[test]
fn test_option_fields_accept_null() {
    let metadata = MetadataResolver::resolve::<Account>().expect("resolves");
    assert!(!metadata.write_accessor("account_id").expect("column").accepts_null());
    assert!(metadata.write_accessor("is_active").expect("column").accepts_null());
    assert!(metadata.write_accessor("created").expect("column").accepts_null());

    let descriptor = Account::table_descriptor();
    let nullable: Vec<_> = descriptor.fields().iter().map(|f| f.is_nullable()).collect();
    assert_eq!(nullable, [false, true, true, false]);
}
