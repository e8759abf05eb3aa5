//! SQL statement rendering for executors backed by an SQL store.
//!
//! The predicate part of every statement comes pre-compiled from the facade; this module
//! only wraps it into `INSERT`/`SELECT`/`UPDATE`/`DELETE`/`DROP` text and lays out the
//! parameter list so the n-th placeholder binds the n-th parameter.

use crate::condition::{Dialect, Predicate};
use crate::value::Value;

use super::{DeleteRequest, ExecutionError, InsertRequest, SelectRequest, UpdateRequest};

/// Statement text plus its ordered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

fn where_clause(sql: &mut String, params: &mut Vec<Value>, predicate: Option<&Predicate>) {
    if let Some(predicate) = predicate {
        sql.push_str(" WHERE ");
        sql.push_str(predicate.template());
        params.extend_from_slice(predicate.params());
    }
}

/// `INSERT INTO t (a, b) VALUES ($1, $2)`; PostgreSQL adds `RETURNING *`.
pub fn insert(dialect: Dialect, request: &InsertRequest<'_>) -> Statement {
    let table = dialect.quote_identifier(request.table_name);
    let mut sql = if request.values.is_empty() {
        match dialect {
            Dialect::Postgres => format!("INSERT INTO {table} DEFAULT VALUES"),
            Dialect::MySql => format!("INSERT INTO {table} () VALUES ()"),
        }
    } else {
        let columns: Vec<String> = request
            .values
            .iter()
            .map(|(column, _)| dialect.quote_identifier(column))
            .collect();
        let placeholders: Vec<String> = (1..=request.values.len())
            .map(|i| dialect.placeholder(i))
            .collect();
        format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        )
    };
    if dialect == Dialect::Postgres {
        sql.push_str(" RETURNING *");
    }
    Statement {
        sql,
        params: request.values.iter().map(|(_, v)| v.clone()).collect(),
    }
}

/// `SELECT * FROM t [WHERE ...]`
pub fn select(dialect: Dialect, request: &SelectRequest<'_>) -> Statement {
    let mut sql = format!("SELECT * FROM {}", dialect.quote_identifier(request.table_name));
    let mut params = Vec::new();
    where_clause(&mut sql, &mut params, request.predicate);
    Statement { sql, params }
}

/// `UPDATE t SET a = $1, b = $2 WHERE <predicate numbered from $3>`
///
/// # Errors
///
/// Returns `ExecutionError::QueryError` when there is nothing to set, or when the
/// predicate placeholders do not continue after the SET values.
pub fn update(dialect: Dialect, request: &UpdateRequest<'_>) -> Result<Statement, ExecutionError> {
    if request.values.is_empty() {
        return Err(ExecutionError::QueryError(format!(
            "UPDATE of \"{}\" has no columns to set",
            request.table_name
        )));
    }
    let expected = request.values.len() + 1;
    if dialect == Dialect::Postgres && request.predicate.first_index() != expected {
        return Err(ExecutionError::QueryError(format!(
            "predicate placeholders start at ${}, expected ${expected}",
            request.predicate.first_index()
        )));
    }
    let assignments: Vec<String> = request
        .values
        .iter()
        .enumerate()
        .map(|(i, (column, _))| {
            format!("{} = {}", dialect.quote_identifier(column), dialect.placeholder(i + 1))
        })
        .collect();
    let mut sql = format!(
        "UPDATE {} SET {}",
        dialect.quote_identifier(request.table_name),
        assignments.join(", ")
    );
    let mut params: Vec<Value> = request.values.iter().map(|(_, v)| v.clone()).collect();
    where_clause(&mut sql, &mut params, Some(request.predicate));
    Ok(Statement { sql, params })
}

/// `DELETE FROM t [WHERE ...]`
pub fn delete(dialect: Dialect, request: &DeleteRequest<'_>) -> Statement {
    let mut sql = format!("DELETE FROM {}", dialect.quote_identifier(request.table_name));
    let mut params = Vec::new();
    where_clause(&mut sql, &mut params, request.predicate);
    Statement { sql, params }
}

/// `DROP TABLE t`
pub fn drop_table(dialect: Dialect, table_name: &str) -> String {
    format!("DROP TABLE {}", dialect.quote_identifier(table_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, PredicateCompiler};

    fn values() -> Vec<(String, Value)> {
        vec![
            ("flag".to_string(), Value::Bool(false)),
            ("name".to_string(), Value::from("Updated")),
        ]
    }

    #[test]
    fn test_insert_postgres_returns_row() {
        let values = values();
        let statement = insert(
            Dialect::Postgres,
            &InsertRequest {
                table_name: "sample",
                values: &values,
            },
        );
        assert_eq!(
            statement.sql,
            r#"INSERT INTO "sample" ("flag", "name") VALUES ($1, $2) RETURNING *"#
        );
        assert_eq!(statement.params.len(), 2);
    }

    #[test]
    fn test_insert_without_values() {
        let statement = insert(
            Dialect::MySql,
            &InsertRequest {
                table_name: "sample",
                values: &[],
            },
        );
        assert_eq!(statement.sql, "INSERT INTO `sample` () VALUES ()");
    }

    #[test]
    fn test_select_with_and_without_predicate() {
        let all = select(
            Dialect::Postgres,
            &SelectRequest {
                table_name: "sample",
                predicate: None,
            },
        );
        assert_eq!(all.sql, r#"SELECT * FROM "sample""#);
        assert!(all.params.is_empty());

        let predicate = PredicateCompiler::new(Dialect::Postgres)
            .compile(&Condition::eq("id", 2))
            .unwrap();
        let filtered = select(
            Dialect::Postgres,
            &SelectRequest {
                table_name: "sample",
                predicate: Some(&predicate),
            },
        );
        assert_eq!(filtered.sql, r#"SELECT * FROM "sample" WHERE "id" = $1"#);
        assert_eq!(filtered.params, vec![Value::Int(2)]);
    }

    #[test]
    fn test_update_puts_set_values_first() {
        let values = values();
        let predicate = PredicateCompiler::new(Dialect::Postgres)
            .starting_at(values.len() + 1)
            .compile(&Condition::eq("id", 2))
            .unwrap();
        let statement = update(
            Dialect::Postgres,
            &UpdateRequest {
                table_name: "sample",
                values: &values,
                predicate: &predicate,
            },
        )
        .unwrap();
        assert_eq!(
            statement.sql,
            r#"UPDATE "sample" SET "flag" = $1, "name" = $2 WHERE "id" = $3"#
        );
        assert_eq!(
            statement.params,
            vec![Value::Bool(false), Value::from("Updated"), Value::Int(2)]
        );
    }

    #[test]
    fn test_update_rejects_misnumbered_predicate() {
        let values = values();
        let predicate = PredicateCompiler::new(Dialect::Postgres)
            .compile(&Condition::eq("id", 2))
            .unwrap();
        let err = update(
            Dialect::Postgres,
            &UpdateRequest {
                table_name: "sample",
                values: &values,
                predicate: &predicate,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ExecutionError::QueryError(_)));
    }

    #[test]
    fn test_update_requires_values() {
        let predicate = PredicateCompiler::new(Dialect::MySql)
            .compile(&Condition::eq("id", 2))
            .unwrap();
        assert!(update(
            Dialect::MySql,
            &UpdateRequest {
                table_name: "sample",
                values: &[],
                predicate: &predicate,
            },
        )
        .is_err());
    }

    #[test]
    fn test_delete_and_drop() {
        let statement = delete(
            Dialect::Postgres,
            &DeleteRequest {
                table_name: "sample",
                predicate: None,
            },
        );
        assert_eq!(statement.sql, r#"DELETE FROM "sample""#);
        assert_eq!(drop_table(Dialect::MySql, "sample"), "DROP TABLE `sample`");
    }
}
