//! Store metrics collection.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Total store operations by backend, operation and namespace.
    pub const OPERATIONS_TOTAL: &str = "starvid_store_operations_total";

    /// Total failed store operations by backend and operation.
    pub const ERRORS_TOTAL: &str = "starvid_store_errors_total";
}

/// Record a store operation.
pub fn record_operation(backend: &'static str, operation: &'static str, namespace: &str) {
    counter!(
        names::OPERATIONS_TOTAL,
        "backend" => backend,
        "operation" => operation,
        "namespace" => namespace.to_string()
    )
    .increment(1);
}

/// Record a failed store operation.
pub fn record_error(backend: &'static str, operation: &'static str) {
    counter!(
        names::ERRORS_TOTAL,
        "backend" => backend,
        "operation" => operation
    )
    .increment(1);
}
