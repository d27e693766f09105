//! Error types for porta-rs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request not found: {0}")]
    NotFound(String),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// The tracker's shared state cannot be locked. Fatal to the caller.
    #[error("request store unavailable: {0}")]
    StoreUnavailable(String),

    /// The work executor could not be constructed (e.g. missing credentials).
    #[error("AI agent not ready: {0}")]
    ExecutorUnavailable(String),

    /// The work executor was constructed but the invocation failed.
    #[error("error processing request: {0}")]
    Executor(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
