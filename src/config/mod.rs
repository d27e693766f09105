//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast on malformed values. The Anthropic key
//! is optional here: a missing key only surfaces when the agent is first
//! built, and then as a per-request error.

pub mod secrets;

use crate::engine::TrackerConfig;
use crate::error::{Error, Result};
use secrecy::SecretString;

pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";

#[derive(Debug)]
pub struct Config {
    pub anthropic_api_key: Option<SecretString>,
    pub anthropic_model: String,
    pub host: String,
    pub port: u16,
    pub max_concurrent_requests: usize,
    pub max_stored_requests: usize,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            anthropic_api_key: optional_var("ANTHROPIC_API_KEY").map(SecretString::from),
            anthropic_model: optional_var("ANTHROPIC_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            host: optional_var("PORTA_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed_var("PORTA_PORT", 8001)?,
            max_concurrent_requests: positive_var("MAX_CONCURRENT_REQUESTS", 5)?,
            max_stored_requests: positive_var("MAX_STORED_REQUESTS", 100)?,
            otel_endpoint: optional_var("OTEL_ENDPOINT"),
            log_level: optional_var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Tracker settings derived from this configuration.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            max_concurrent: self.max_concurrent_requests,
            capacity: self.max_stored_requests,
            ..TrackerConfig::default()
        }
    }
}

/// Unset and empty are the same thing for our purposes.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match optional_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{name} has invalid value '{raw}'"))),
        None => Ok(default),
    }
}

fn positive_var(name: &str, default: usize) -> Result<usize> {
    let value = parsed_var(name, default)?;
    if value == 0 {
        return Err(Error::Config(format!("{name} must be a positive integer")));
    }
    Ok(value)
}
