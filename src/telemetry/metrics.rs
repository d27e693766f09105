//! Metric instruments for porta-rs.
//!
//! Built from the `"porta"` meter on the globally registered
//! `MeterProvider`. Without an OTLP endpoint the global provider is a no-op,
//! so recording is always safe.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("porta")
}

/// Counter: chat requests accepted into the queue.
/// Labels: `result` ("ok" | "error").
pub fn requests_submitted() -> Counter<u64> {
    meter()
        .u64_counter("porta.requests.submitted")
        .with_description("Number of chat requests submitted")
        .build()
}

/// Counter: request status transitions.
/// Labels: `from`, `to`.
pub fn status_transitions() -> Counter<u64> {
    meter()
        .u64_counter("porta.requests.status_transitions")
        .with_description("Number of request status transitions")
        .build()
}

/// Counter: terminal records dropped by the eviction pass.
pub fn requests_evicted() -> Counter<u64> {
    meter()
        .u64_counter("porta.requests.evicted")
        .with_description("Number of result records evicted")
        .build()
}

/// Histogram: executor wall time per request, in milliseconds.
/// Labels: `outcome` ("completed" | "error").
pub fn executor_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("porta.executor.duration_ms")
        .with_description("Work executor duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Counter: admission loop iterations that failed and backed off.
pub fn admission_errors() -> Counter<u64> {
    meter()
        .u64_counter("porta.admission.errors")
        .with_description("Admission loop iterations that hit an error")
        .build()
}
