use std::sync::Mutex;

use porta_rs::config::Config;
use porta_rs::config::secrets::ExposeSecret;

/// Env vars are process-wide; tests in this file take turns.
static ENV: Mutex<()> = Mutex::new(());

const VARS: &[&str] = &[
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_MODEL",
    "PORTA_HOST",
    "PORTA_PORT",
    "MAX_CONCURRENT_REQUESTS",
    "MAX_STORED_REQUESTS",
    "OTEL_ENDPOINT",
    "LOG_LEVEL",
];

fn clear_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

#[test]
fn config_defaults_without_env() {
    let _lock = ENV.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let config = Config::from_env().unwrap();
    assert!(config.anthropic_api_key.is_none());
    assert_eq!(config.anthropic_model, porta_rs::config::DEFAULT_MODEL);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8001);
    assert_eq!(config.max_concurrent_requests, 5);
    assert_eq!(config.max_stored_requests, 100);
    assert!(config.otel_endpoint.is_none());
    assert_eq!(config.log_level, "info");
}

#[test]
fn config_reads_overrides() {
    let _lock = ENV.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    unsafe {
        std::env::set_var("ANTHROPIC_API_KEY", "sk-test-key");
        std::env::set_var("PORTA_PORT", "9100");
        std::env::set_var("MAX_CONCURRENT_REQUESTS", "3");
        std::env::set_var("MAX_STORED_REQUESTS", "10");
    }

    let config = Config::from_env().unwrap();
    assert_eq!(
        config.anthropic_api_key.as_ref().unwrap().expose_secret(),
        "sk-test-key"
    );
    assert_eq!(config.port, 9100);

    let tracker = config.tracker_config();
    assert_eq!(tracker.max_concurrent, 3);
    assert_eq!(tracker.capacity, 10);
    assert_eq!(tracker.poll_interval, std::time::Duration::from_millis(100));

    clear_env();
}

#[test]
fn config_rejects_zero_and_garbage() {
    let _lock = ENV.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    unsafe { std::env::set_var("MAX_CONCURRENT_REQUESTS", "0") };
    assert!(Config::from_env().is_err());

    unsafe { std::env::set_var("MAX_CONCURRENT_REQUESTS", "five") };
    assert!(Config::from_env().is_err());

    clear_env();
    unsafe { std::env::set_var("PORTA_PORT", "70000") };
    assert!(Config::from_env().is_err());

    clear_env();
}

#[test]
fn api_key_is_redacted_in_debug_output() {
    let _lock = ENV.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    unsafe { std::env::set_var("ANTHROPIC_API_KEY", "sk-very-secret") };

    let config = Config::from_env().unwrap();
    assert!(!format!("{config:?}").contains("sk-very-secret"));

    clear_env();
}
