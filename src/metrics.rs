//! Prometheus metrics for statements sent to PostgreSQL.
//!
//! Every statement the [`PostgresExecutor`](crate::PostgresExecutor) runs is counted
//! and timed under a `statement` label (`insert`, `select`, `update`, `delete`,
//! `exists`, `drop`, `health`). Failed statements are also counted separately.
//! Collectors live in [`METRICS`]; scrape them with [`render`] or register
//! `METRICS.registry` with your own exporter.

use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// `None` when the collectors could not be registered; recording is then a no-op.
pub static METRICS: Lazy<Option<FacadeMetrics>> = Lazy::new(|| match FacadeMetrics::init() {
    Ok(metrics) => Some(metrics),
    Err(err) => {
        log::warn!("Statement metrics disabled: {err}");
        None
    }
});

pub struct FacadeMetrics {
    pub registry: Registry,
    pub statements_total: IntCounterVec,
    pub statement_errors_total: IntCounterVec,
    pub statement_duration: HistogramVec,
}

impl FacadeMetrics {
    fn init() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let statements_total = IntCounterVec::new(
            Opts::new("tablefacade_statements_total", "Total statements executed"),
            &["statement"],
        )?;
        let statement_errors_total = IntCounterVec::new(
            Opts::new(
                "tablefacade_statement_errors_total",
                "Statements that returned an error",
            ),
            &["statement"],
        )?;
        let statement_duration = HistogramVec::new(
            HistogramOpts::new(
                "tablefacade_statement_duration_seconds",
                "Duration of statements",
            ),
            &["statement"],
        )?;

        registry.register(Box::new(statements_total.clone()))?;
        registry.register(Box::new(statement_errors_total.clone()))?;
        registry.register(Box::new(statement_duration.clone()))?;

        Ok(Self {
            registry,
            statements_total,
            statement_errors_total,
            statement_duration,
        })
    }

    pub fn record_statement(&self, statement: &str, elapsed: Duration, succeeded: bool) {
        self.statements_total.with_label_values(&[statement]).inc();
        self.statement_duration
            .with_label_values(&[statement])
            .observe(elapsed.as_secs_f64());
        if !succeeded {
            self.statement_errors_total.with_label_values(&[statement]).inc();
        }
    }
}

/// Record one statement, if metrics are available.
pub fn record_statement(statement: &str, elapsed: Duration, succeeded: bool) {
    if let Some(metrics) = METRICS.as_ref() {
        metrics.record_statement(statement, elapsed, succeeded);
    }
}

/// Label for a rendered statement: its leading keyword, lowercased.
pub fn statement_kind(sql: &str) -> &'static str {
    let keyword = sql.split_whitespace().next().unwrap_or_default();
    ["insert", "select", "update", "delete", "drop"]
        .into_iter()
        .find(|kind| keyword.eq_ignore_ascii_case(kind))
        .unwrap_or("other")
}

/// Prometheus text exposition of every collector, empty if metrics are disabled.
pub fn render() -> String {
    let Some(metrics) = METRICS.as_ref() else {
        return String::new();
    };
    let mut buffer = Vec::new();
    if let Err(err) = TextEncoder::new().encode(&metrics.registry.gather(), &mut buffer) {
        log::warn!("Failed to encode statement metrics: {err}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
