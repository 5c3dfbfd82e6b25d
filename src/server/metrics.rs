//! Prometheus metrics exporter
//!
//! - Operation counters, labeled by operation and outcome
//! - Database and stack gauges, refreshed from a Pila status at scrape time

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tracing::{error, info};

use crate::pila::Status;

lazy_static::lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    pub static ref OPERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("piladb_operations_total", "Total number of piladb operations"),
        &["operation", "status"]
    ).expect("valid operations_total definition");

    pub static ref DATABASES: IntGauge = IntGauge::new(
        "piladb_databases",
        "Number of databases in the Pila"
    ).expect("valid databases definition");

    pub static ref STACKS: IntGauge = IntGauge::new(
        "piladb_stacks",
        "Number of stacks across all databases"
    ).expect("valid stacks definition");
}

/// Initialize metrics registry
pub fn init_metrics() {
    info!("Initializing Prometheus metrics");

    // Registering twice fails harmlessly
    METRICS_REGISTRY.register(Box::new(OPERATIONS_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(DATABASES.clone())).ok();
    METRICS_REGISTRY.register(Box::new(STACKS.clone())).ok();
}

/// Record an operation outcome
pub fn record_operation(operation: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    OPERATIONS_TOTAL.with_label_values(&[operation, status]).inc();
}

/// Update gauges from a status snapshot
pub fn refresh(status: &Status) {
    DATABASES.set(status.number_of_databases as i64);
    STACKS.set(status.number_of_stacks() as i64);
}

/// Export all metrics in Prometheus text format
pub fn export_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|_| String::from("# Error converting metrics\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pila::DatabaseStatus;

    #[test]
    fn test_init_metrics_is_idempotent() {
        init_metrics();
        init_metrics();
    }

    #[test]
    fn test_record_operation() {
        let before = OPERATIONS_TOTAL.with_label_values(&["push", "success"]).get();
        record_operation("push", true);
        assert!(OPERATIONS_TOTAL.with_label_values(&["push", "success"]).get() > before);
    }

    #[test]
    fn test_refresh_and_export() {
        init_metrics();
        refresh(&Status {
            number_of_databases: 1,
            databases: vec![DatabaseStatus {
                id: "d".to_string(),
                name: "db".to_string(),
                number_of_stacks: 4,
            }],
        });

        let output = export_metrics();
        assert!(output.contains("piladb_databases"));
        assert!(output.contains("piladb_stacks"));
    }
}
