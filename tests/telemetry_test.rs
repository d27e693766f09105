//! Telemetry initialization and span helpers.

use porta_rs::model::{RequestId, Status};

#[test]
fn telemetry_initializes_without_endpoint() {
    // The global subscriber can only be set once per process; a second
    // init in the same process returns Err, which is fine here.
    let config = porta_rs::telemetry::TelemetryConfig {
        endpoint: None,
        service_name: "porta-test".to_string(),
        log_level: "debug".to_string(),
    };
    if let Ok(guard) = porta_rs::telemetry::init_telemetry(config) {
        assert!(!guard.is_exporting());
        guard.force_flush();
    }
}

#[test]
fn chat_span_records_turns() {
    let span = porta_rs::telemetry::genai::start_chat_span("claude-3-7-sonnet-20250219", "anthropic");
    porta_rs::telemetry::genai::record_turns(&span, 4);
}

#[test]
fn request_span_records_transitions() {
    let span = porta_rs::telemetry::request::start_request_span(RequestId::new(), "user-1");
    porta_rs::telemetry::request::record_status_transition(&span, Status::Queued, Status::Processing);
    porta_rs::telemetry::request::record_status_transition(&span, Status::Processing, Status::Completed);
}

#[test]
fn metrics_record_without_a_provider() {
    use opentelemetry::KeyValue;

    porta_rs::telemetry::metrics::requests_submitted().add(1, &[KeyValue::new("result", "ok")]);
    porta_rs::telemetry::metrics::requests_evicted().add(3, &[]);
    porta_rs::telemetry::metrics::executor_duration_ms()
        .record(12.5, &[KeyValue::new("outcome", "completed")]);
}
