//! Request execution span helpers.
//!
//! One span per admitted request, covering status updates, the executor
//! call and the terminal write.

use tracing::Span;

use crate::model::{RequestId, Status};

/// Start a span for one request's trip through a worker.
///
/// `request.status` is declared empty and filled by
/// [`record_status_transition`].
pub fn start_request_span(request_id: RequestId, user_id: &str) -> Span {
    tracing::info_span!(
        "request.process",
        "request.id" = %request_id,
        "request.user_id" = user_id,
        "request.status" = tracing::field::Empty,
    )
}

/// Emit a status-transition event on the span and remember the new status.
pub fn record_status_transition(span: &Span, from: Status, to: Status) {
    span.record("request.status", to.as_str());
    span.in_scope(|| {
        tracing::info!(from = from.as_str(), to = to.as_str(), "status_transition");
    });
}
