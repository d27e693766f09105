//! Worker execution for one admitted request.
//!
//! queued -> processing, call the executor on its own task, normalize the
//! response, then one locked write for the terminal status plus the
//! eviction pass. The admission slot is released on every path.

use std::sync::Arc;
use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::{Instrument, Span, error, info, warn};

use super::tracker::RequestTracker;
use crate::error::{Error, Result};
use crate::model::{RequestId, Status, WorkItem, conversation_history};
use crate::normalize::normalize_response;
use crate::telemetry::metrics;
use crate::telemetry::request::{record_status_transition, start_request_span};

/// Holds an admission slot; releases it when the worker ends, however it ends.
struct SlotGuard {
    tracker: RequestTracker,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.tracker.release_slot();
    }
}

impl RequestTracker {
    pub(super) async fn process(self, item: WorkItem) {
        let _slot = SlotGuard {
            tracker: self.clone(),
        };
        let span = start_request_span(item.id, &item.user_id);
        self.process_in_span(item, &span)
            .instrument(span.clone())
            .await;
    }

    async fn process_in_span(&self, item: WorkItem, span: &Span) {
        let id = item.id;

        let started = self.lock().and_then(|mut store| store.start(id));
        if let Err(e) = started {
            warn!(request_id = %id, error = %e, "could not mark request processing");
            self.abandon(id, format!("could not start processing: {e}"), span);
            return;
        }
        record_transition(span, Status::Queued, Status::Processing);

        let clock = Instant::now();
        let outcome = self.execute(item).await;
        let duration_ms = clock.elapsed().as_secs_f64() * 1000.0;

        self.finish(id, outcome, span, duration_ms);
    }

    /// Build the executor if needed and run it, both on their own task.
    /// Construction and invocation failures come back as `Err`, and so does
    /// a panic in either.
    async fn execute(&self, item: WorkItem) -> Result<String> {
        let lazy = Arc::clone(self.executor());
        let history = conversation_history(&item.history);
        let message = item.message;

        let call = tokio::spawn(
            async move {
                let executor = lazy.get().await?;
                executor.execute(&message, &history).await
            }
            .in_current_span(),
        );

        match call.await {
            Ok(Ok(value)) => Ok(normalize_response(&value)),
            Ok(Err(e @ (Error::Executor(_) | Error::ExecutorUnavailable(_)))) => Err(e),
            Ok(Err(other)) => Err(Error::Executor(other.to_string())),
            Err(join) => Err(Error::Executor(format!("executor task failed: {join}"))),
        }
    }

    /// Write the terminal status and run the eviction pass, under one lock.
    fn finish(&self, id: RequestId, outcome: Result<String>, span: &Span, duration_ms: f64) {
        let failure = outcome.as_ref().err().map(ToString::to_string);
        let to = if outcome.is_ok() {
            Status::Completed
        } else {
            Status::Error
        };

        let written = self.lock().and_then(|mut store| {
            match outcome {
                Ok(response) => store.complete(id, response)?,
                Err(e) => store.fail(id, e.to_string())?,
            }
            Ok(store.evict(self.config().capacity))
        });

        let evicted = match written {
            Ok(evicted) => evicted,
            Err(e) => {
                error!(request_id = %id, error = %e, "could not record request outcome");
                return;
            }
        };

        record_transition(span, Status::Processing, to);
        metrics::executor_duration_ms().record(duration_ms, &[KeyValue::new("outcome", to.as_str())]);
        match failure {
            None => info!(request_id = %id, duration_ms, "request completed"),
            Some(error) => warn!(request_id = %id, duration_ms, %error, "request failed"),
        }

        if !evicted.is_empty() {
            metrics::requests_evicted().add(evicted.len() as u64, &[]);
            info!(count = evicted.len(), "evicted old request records");
        }
    }

    /// Fail a record that never reached processing.
    fn abandon(&self, id: RequestId, reason: String, span: &Span) {
        match self.lock().and_then(|mut store| store.fail(id, reason)) {
            Ok(()) => record_transition(span, Status::Queued, Status::Error),
            Err(e) => error!(request_id = %id, error = %e, "could not record request outcome"),
        }
    }
}

fn record_transition(span: &Span, from: Status, to: Status) {
    record_status_transition(span, from, to);
    metrics::status_transitions().add(
        1,
        &[
            KeyValue::new("from", from.as_str()),
            KeyValue::new("to", to.as_str()),
        ],
    );
}
