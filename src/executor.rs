//! The work executor seam.
//!
//! An executor turns a message plus prior turns into a response value. It
//! is expensive to build (credentials, HTTP client, agent wiring) and slow
//! to call, so the tracker reaches it through a [`LazyExecutor`] that builds
//! it once, on first use, and keeps it for the life of the process.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::error::{Error, Result};
use crate::model::ChatTurn;

/// Produces a response for one request.
///
/// The returned value may be any shape; the tracker normalizes it to a
/// string (see [`crate::normalize`]).
#[async_trait]
pub trait WorkExecutor: Send + Sync {
    async fn execute(&self, message: &str, history: &[ChatTurn]) -> Result<Value>;
}

type Factory = Box<dyn Fn() -> Result<Arc<dyn WorkExecutor>> + Send + Sync>;

/// Memoizing accessor for the process-wide executor.
///
/// Construction is serialized by the cell's own lock, independent of the
/// tracker's. A failed build is not cached: the next caller tries again.
pub struct LazyExecutor {
    cell: OnceCell<Arc<dyn WorkExecutor>>,
    factory: Factory,
}

impl LazyExecutor {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn WorkExecutor>> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Box::new(factory),
        }
    }

    /// Wrap an executor that is already built.
    pub fn ready(executor: Arc<dyn WorkExecutor>) -> Self {
        Self {
            cell: OnceCell::new_with(Some(executor)),
            factory: Box::new(|| Err(Error::Other("executor already initialized".to_string()))),
        }
    }

    /// Get the executor, building it on first use.
    ///
    /// # Errors
    /// Returns [`Error::ExecutorUnavailable`] if construction fails.
    pub async fn get(&self) -> Result<Arc<dyn WorkExecutor>> {
        self.cell
            .get_or_try_init(|| async {
                (self.factory)().map_err(|e| match e {
                    Error::ExecutorUnavailable(_) => e,
                    other => Error::ExecutorUnavailable(other.to_string()),
                })
            })
            .await
            .cloned()
    }

    /// Has the executor been built successfully?
    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }
}

impl std::fmt::Debug for LazyExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyExecutor")
            .field("ready", &self.is_ready())
            .finish()
    }
}
