//! Span constructors for facade operations and executor statements.
//!
//! Compiled in with the default `tracing` feature. Callers enter the span for the
//! duration of the operation:
//!
//! ```ignore
//! #[cfg(feature = "tracing")]
//! let _span = tracing_helpers::operation_span("insert", table_name).entered();
//! ```

use tracing::Span;

/// `tablefacade.<operation>` span carrying the target table.
pub fn operation_span(operation: &'static str, table: &str) -> Span {
    match operation {
        "insert" => tracing::debug_span!("tablefacade.insert", table),
        "find" => tracing::debug_span!("tablefacade.find", table),
        "find_all" => tracing::debug_span!("tablefacade.find_all", table),
        "update" => tracing::debug_span!("tablefacade.update", table),
        "delete" => tracing::debug_span!("tablefacade.delete", table),
        "exists_table" => tracing::debug_span!("tablefacade.exists_table", table),
        "drop_table" => tracing::info_span!("tablefacade.drop_table", table),
        _ => tracing::debug_span!("tablefacade.operation", operation, table),
    }
}

/// One statement sent to the database.
pub fn execute_statement_span(sql: &str) -> Span {
    tracing::debug_span!("tablefacade.execute", sql)
}

/// Connection establishment.
pub fn connect_span() -> Span {
    tracing::debug_span!("tablefacade.connect")
}

/// First resolution of an entity type's metadata.
pub fn resolve_span(type_name: &'static str) -> Span {
    tracing::trace_span!("tablefacade.resolve", type_name)
}
