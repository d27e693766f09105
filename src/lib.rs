//! # porta-rs
//!
//! Backend for the Porta finance assistant. Chat requests are queued,
//! admitted into processing under a fixed concurrency limit, executed by a
//! pluggable work executor (an LLM agent in production), and tracked in a
//! bounded in-memory result store that clients poll over HTTP.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod llm;
pub mod model;
pub mod normalize;
pub mod telemetry;
