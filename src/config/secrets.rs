//! Secret handling.
//!
//! Re-exports the secrecy types the agent credentials are wrapped in, so
//! callers never need to depend on secrecy directly.

pub use secrecy::{ExposeSecret, SecretString};
