//! Request engine: bounded admission, worker execution, result tracking.

pub mod store;
pub mod tracker;
mod worker;

pub use store::RequestStore;
pub use tracker::{RequestTracker, TrackerConfig};
