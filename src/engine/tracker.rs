//! Request tracker: the public API for submitting and querying chat
//! requests, and the admission loop that feeds admitted work to workers.
//!
//! All shared state (queue, result records, in-flight counter) lives in one
//! [`RequestStore`] behind one mutex. The mutex is only ever held for
//! in-memory bookkeeping, never across an await or an executor call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use opentelemetry::KeyValue;
use tokio::sync::Notify;
use tracing::{debug, error, info};

use super::store::RequestStore;
use crate::error::{Error, Result};
use crate::executor::LazyExecutor;
use crate::model::{ChatRequest, QueueStats, RequestId, ResultRecord, Submitted, WorkItem};
use crate::telemetry::metrics;

/// Tuning knobs for the tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Maximum requests processing at once.
    pub max_concurrent: usize,
    /// Result-store size above which terminal records get evicted.
    pub capacity: usize,
    /// How long the admission loop waits when there is nothing to admit.
    pub poll_interval: Duration,
    /// How long the admission loop backs off after an error.
    pub error_backoff: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            capacity: 100,
            poll_interval: Duration::from_millis(100),
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// Handle to the tracker. Cheap to clone; clones share all state.
pub struct RequestTracker {
    store: Arc<Mutex<RequestStore>>,
    executor: Arc<LazyExecutor>,
    config: TrackerConfig,
    /// Signalled on submission and whenever a slot frees up.
    work_ready: Arc<Notify>,
    shutdown: Arc<Notify>,
}

impl Clone for RequestTracker {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            executor: Arc::clone(&self.executor),
            config: self.config.clone(),
            work_ready: Arc::clone(&self.work_ready),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl RequestTracker {
    pub fn new(executor: Arc<LazyExecutor>, config: TrackerConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(RequestStore::new())),
            executor,
            config,
            work_ready: Arc::new(Notify::new()),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn executor(&self) -> &Arc<LazyExecutor> {
        &self.executor
    }

    /// Queue a chat request. Returns immediately with the new ID.
    ///
    /// # Errors
    /// Returns [`Error::StoreUnavailable`] if the store cannot be locked.
    pub fn submit(&self, request: ChatRequest) -> Result<Submitted> {
        let item = WorkItem {
            id: RequestId::new(),
            message: request.message,
            user_id: request.user_id,
            history: request.history,
            created_at: Utc::now(),
        };
        let id = item.id;

        let record = match self.lock() {
            Ok(mut store) => store.enqueue(item),
            Err(e) => {
                metrics::requests_submitted().add(1, &[KeyValue::new("result", "error")]);
                return Err(e);
            }
        };
        self.work_ready.notify_one();

        metrics::requests_submitted().add(1, &[KeyValue::new("result", "ok")]);
        debug!(request_id = %id, user_id = %record.user_id, "request queued");

        Ok(Submitted {
            request_id: id,
            status: record.status,
        })
    }

    /// Current record for a request.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the ID was never submitted or has been evicted.
    pub fn status(&self, id: RequestId) -> Result<ResultRecord> {
        self.lock()?.get(id)
    }

    /// The `limit` most recently submitted records still held.
    pub fn recent(&self, limit: usize) -> Result<Vec<ResultRecord>> {
        Ok(self.lock()?.recent(limit))
    }

    pub fn stats(&self) -> Result<QueueStats> {
        Ok(self.lock()?.stats(self.config.max_concurrent))
    }

    /// Poll until the request reaches a terminal status.
    ///
    /// Wrap in `tokio::time::timeout` to bound the wait.
    pub async fn wait(&self, id: RequestId, poll: Duration) -> Result<ResultRecord> {
        loop {
            let record = self.status(id)?;
            if record.status.is_terminal() {
                return Ok(record);
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Signal the admission loop to stop.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Run the admission loop until shutdown.
    ///
    /// Admits queued requests while slots are free, handing each to its own
    /// worker task. Errors back off and retry; they never end the loop.
    pub async fn run(&self) -> Result<()> {
        info!(
            max_concurrent = self.config.max_concurrent,
            capacity = self.config.capacity,
            "admission loop started"
        );

        loop {
            let backing_off = match self.admit_next() {
                Ok(Some(item)) => {
                    self.dispatch(item);
                    continue;
                }
                Ok(None) => false,
                Err(e) => {
                    error!(error = %e, "admission loop error, backing off");
                    metrics::admission_errors().add(1, &[]);
                    true
                }
            };

            let pause = if backing_off {
                self.config.error_backoff
            } else {
                self.config.poll_interval
            };

            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("admission loop shutting down");
                    return Ok(());
                }
                _ = self.work_ready.notified(), if !backing_off => {}
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }

    /// Check a slot is free and the queue is non-empty, and take both,
    /// in one lock acquisition.
    fn admit_next(&self) -> Result<Option<WorkItem>> {
        Ok(self.lock()?.admit(self.config.max_concurrent))
    }

    fn dispatch(&self, item: WorkItem) {
        debug!(request_id = %item.id, "request admitted");
        let tracker = self.clone();
        tokio::spawn(async move { tracker.process(item).await });
    }

    /// Give back an admission slot and wake the loop.
    ///
    /// Runs from a drop guard, so it must not fail: a poisoned lock still
    /// gets its counter decremented.
    pub(super) fn release_slot(&self) {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        store.release();
        drop(store);
        self.work_ready.notify_one();
    }

    pub(super) fn lock(&self) -> Result<MutexGuard<'_, RequestStore>> {
        self.store
            .lock()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))
    }
}
