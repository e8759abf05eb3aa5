//! End-to-end facade tests on the in-memory executor.

use std::sync::Arc;

use tablefacade::{
    CompositeCondition, Condition, Dialect, FacadeError, InsertRequest, LogicalOperator,
    MemoryExecutor, MetadataRegistry, TableEntity, TableExecutor, TableOperations, Value,
    ValueError,
};

#[derive(Debug, Default, Clone, PartialEq, TableEntity)]
#[table_name = "sample"]
struct Sample {
    #[column_name = "id"]
    id: i32,
    #[column_name = "flag"]
    flag: bool,
    #[column_name = "name"]
    name: String,
}

#[derive(Debug, Default, Clone, PartialEq, TableEntity)]
#[table_name = "events"]
struct Event {
    #[column_name = "id"]
    id: Option<i64>,
    #[column_name = "kind"]
    kind: String,
    #[column_name = "weight"]
    weight: Option<f64>,
}

fn sample(id: i32, flag: bool, name: &str) -> Sample {
    Sample {
        id,
        flag,
        name: name.to_string(),
    }
}

fn sample_ops() -> TableOperations<MemoryExecutor> {
    let executor = MemoryExecutor::new();
    executor.create_table("sample", &["id", "flag", "name"]);
    TableOperations::new(executor, Arc::new(MetadataRegistry::new()))
}

#[test]
fn test_insert_find_update_roundtrip() {
    let ops = sample_ops();
    let inserted = ops.insert(&sample(2, true, "Sample")).expect("insert");
    assert_eq!(inserted, sample(2, true, "Sample"));

    let found = ops
        .find::<Sample>(&Condition::eq("id", 2))
        .expect("find")
        .expect("row exists");
    assert!(found.flag);
    assert_eq!(found.name, "Sample");

    let affected = ops
        .update::<Sample>(
            &Condition::eq("id", 2),
            &[("flag", Value::Bool(false)), ("name", Value::from("Updated"))],
        )
        .expect("update");
    assert_eq!(affected, 1);

    let found = ops
        .find::<Sample>(&Condition::eq("id", 2))
        .expect("find")
        .expect("row exists");
    assert!(!found.flag);
    assert_eq!(found.name, "Updated");
}

#[test]
fn test_composite_condition_selects_matching_group() {
    let ops = sample_ops();
    ops.insert(&sample(4, true, "X")).expect("insert");
    ops.insert(&sample(5, false, "Y")).expect("insert");

    let condition = Condition::or([
        Condition::and([Condition::eq("id", 4), Condition::eq("name", "X")]).expect("and"),
        Condition::and([Condition::eq("id", 5), Condition::eq("flag", true)]).expect("and"),
    ])
    .expect("or");

    let matches: Vec<Sample> = ops
        .find_all_where(&condition)
        .expect("select")
        .collect::<Result<_, _>>()
        .expect("materialize");
    assert_eq!(matches, vec![sample(4, true, "X")]);
}

#[test]
fn test_builder_conditions_drive_queries() {
    let ops = sample_ops();
    for (id, flag, name) in [(1, true, "a"), (2, false, "b"), (3, true, "c")] {
        ops.insert(&sample(id, flag, name)).expect("insert");
    }

    let composite = CompositeCondition::builder()
        .operator(LogicalOperator::And)
        .condition(Condition::eq("flag", true))
        .condition(Condition::gt("id", 1))
        .build()
        .expect("build");
    let found = ops.find::<Sample>(&composite.into()).expect("find");
    assert_eq!(found, Some(sample(3, true, "c")));

    let err = CompositeCondition::builder()
        .condition(Condition::eq("flag", true))
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_delete_then_delete_all() {
    let ops = sample_ops();
    for (id, flag, name) in [(1, true, "a"), (2, false, "b"), (3, true, "c")] {
        ops.insert(&sample(id, flag, name)).expect("insert");
    }
    assert_eq!(ops.delete::<Sample>(&Condition::eq("flag", true)).expect("delete"), 2);
    let remaining: Vec<Sample> = ops
        .find_all()
        .expect("select")
        .collect::<Result<_, _>>()
        .expect("materialize");
    assert_eq!(remaining, vec![sample(2, false, "b")]);
    assert_eq!(ops.delete_all::<Sample>().expect("delete all"), 1);
    assert_eq!(ops.find_all::<Sample>().expect("select").len(), 0);
}

#[test]
fn test_drop_table_reports_missing_tables() {
    let ops = sample_ops();
    assert!(ops.exists_table("sample").expect("exists"));
    ops.drop_table("sample").expect("drop");
    assert!(!ops.exists_table("sample").expect("exists"));

    let err = ops.drop_table("sample").unwrap_err();
    assert!(matches!(err, FacadeError::Execution(_)));
    assert!(err.to_string().to_lowercase().contains("drop table failed"));

    let err = ops.find::<Sample>(&Condition::eq("id", 1)).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_nullable_fields_and_identity() {
    let executor = MemoryExecutor::new();
    executor.create_table_with_identity("events", &["id", "kind", "weight"], "id");
    let ops = TableOperations::new(executor, Arc::new(MetadataRegistry::new()));

    let stored = ops
        .insert(&Event {
            id: None,
            kind: "click".to_string(),
            weight: None,
        })
        .expect("insert");
    assert_eq!(stored.id, Some(1));
    assert_eq!(stored.weight, None);

    ops.insert(&Event {
        id: None,
        kind: "view".to_string(),
        weight: Some(0.5),
    })
    .expect("insert");

    // weight IS NULL on the first event, so it matches neither side
    let heavy: Vec<Event> = ops
        .find_all_where(&Condition::gte("weight", 0.25))
        .expect("select")
        .collect::<Result<_, _>>()
        .expect("materialize");
    assert_eq!(heavy.len(), 1);
    assert_eq!(heavy[0].kind, "view");
    let light = ops
        .find_all_where::<Event>(&Condition::lt("weight", 0.25))
        .expect("select");
    assert_eq!(light.len(), 0);
}

#[test]
fn test_registry_is_shared_between_facades() {
    let registry = Arc::new(MetadataRegistry::new());
    let first = MemoryExecutor::new();
    first.create_table("sample", &["id", "flag", "name"]);
    let second = MemoryExecutor::new().with_dialect(Dialect::MySql);
    second.create_table("sample", &["id", "flag", "name"]);

    let a = TableOperations::new(first, Arc::clone(&registry));
    let b = TableOperations::new(second, Arc::clone(&registry));
    a.insert(&sample(1, true, "pg")).expect("insert");
    b.insert(&sample(1, true, "my")).expect("insert");

    assert!(Arc::ptr_eq(
        &a.metadata::<Sample>().expect("metadata"),
        &b.metadata::<Sample>().expect("metadata"),
    ));
    assert_eq!(registry.len(), 1);

    let found = b
        .find::<Sample>(&Condition::and([Condition::eq("id", 1), Condition::eq("flag", true)]).expect("and"))
        .expect("find");
    assert_eq!(found.map(|s| s.name), Some("my".to_string()));
}

#[test]
fn test_concurrent_coroutines_share_resolution() {
    let registry = Arc::new(MetadataRegistry::new());
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            may::go!(move || registry.resolve::<Sample>().expect("resolve"))
        })
        .collect();
    let resolved: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("coroutine panicked"))
        .collect();
    for metadata in &resolved[1..] {
        assert!(Arc::ptr_eq(&resolved[0], metadata));
    }
}

/// Stores `values` as given, bypassing the entity mapping.
fn insert_raw(ops: &TableOperations<MemoryExecutor>, values: Vec<(&str, Value)>) {
    let values: Vec<(String, Value)> = values
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect();
    ops.executor()
        .insert(&InsertRequest {
            table_name: "sample",
            values: &values,
        })
        .expect("raw insert");
}

#[test]
fn test_failed_statements_leave_table_untouched() {
    let ops = sample_ops();
    ops.insert(&sample(1, true, "a")).expect("insert");
    insert_raw(&ops, vec![("id", Value::Int(2)), ("flag", Value::Bool(false)), ("name", Value::Int(9))]);
    ops.insert(&sample(3, false, "c")).expect("insert");

    let err = ops.delete::<Sample>(&Condition::eq("name", "zzz")).unwrap_err();
    assert!(matches!(err, FacadeError::Execution(_)));
    assert_eq!(ops.executor().row_count("sample"), Some(3));

    let err = ops
        .update::<Sample>(&Condition::eq("name", "a"), &[("id", Value::Int(100))])
        .unwrap_err();
    assert!(matches!(err, FacadeError::Execution(_)));
    assert!(ops
        .find::<Sample>(&Condition::eq("id", 100))
        .expect("find")
        .is_none());

    // rows that do not touch the bad cell are still reachable by id
    let first = ops
        .find::<Sample>(&Condition::eq("id", 1))
        .expect("find")
        .expect("row 1 kept");
    assert_eq!(first, sample(1, true, "a"));
}

#[test]
fn test_null_into_required_field_is_a_materialization_error() {
    let ops = sample_ops();
    ops.insert(&sample(1, true, "ok")).expect("insert");
    insert_raw(&ops, vec![("id", Value::Int(2)), ("name", Value::from("no flag"))]);

    let err = ops.find::<Sample>(&Condition::eq("id", 2)).unwrap_err();
    assert!(matches!(
        err,
        FacadeError::Materialization { ref column, source: ValueError::NullValue } if column == "flag"
    ));

    let results: Vec<_> = ops.find_all::<Sample>().expect("select").collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().expect("row 1"), &sample(1, true, "ok"));
    assert!(results[1].is_err());
}
