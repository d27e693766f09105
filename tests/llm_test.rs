//! Anthropic agent executor.

use std::sync::Arc;

use porta_rs::config::secrets::SecretString;
use porta_rs::error::Error;
use porta_rs::executor::{LazyExecutor, WorkExecutor};
use porta_rs::llm::AgentExecutor;
use porta_rs::model::ChatTurn;
use porta_rs::normalize::normalize_response;

#[test]
fn missing_api_key_is_executor_unavailable() {
    match AgentExecutor::build(None, "claude-3-7-sonnet-20250219") {
        Err(Error::ExecutorUnavailable(msg)) => assert!(msg.contains("ANTHROPIC_API_KEY")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("agent built without a key"),
    }
}

#[tokio::test]
async fn agent_builds_with_a_key_without_network() {
    let key = SecretString::from("sk-ant-test");
    let executor = AgentExecutor::build(Some(&key), "claude-3-7-sonnet-20250219").unwrap();
    assert_eq!(executor.model(), "claude-3-7-sonnet-20250219");
}

#[tokio::test]
async fn lazy_agent_reports_missing_key_per_call() {
    let lazy = LazyExecutor::new(|| {
        AgentExecutor::build(None, "claude-3-7-sonnet-20250219")
            .map(|e| Arc::new(e) as Arc<dyn WorkExecutor>)
    });
    let err = lazy.get().await.err().expect("build should fail");
    assert!(err.to_string().starts_with("AI agent not ready"));
    assert!(!lazy.is_ready());
}

#[tokio::test]
#[ignore] // requires ANTHROPIC_API_KEY and network access
async fn live_chat_returns_text() {
    dotenvy::dotenv().ok();
    let key = SecretString::from(std::env::var("ANTHROPIC_API_KEY").expect("ANTHROPIC_API_KEY"));
    let executor = AgentExecutor::build(Some(&key), porta_rs::config::DEFAULT_MODEL).unwrap();

    let history = vec![
        ChatTurn::user("My name is Sam."),
        ChatTurn::assistant("Nice to meet you, Sam."),
    ];
    let value = executor
        .execute("What is my name? Answer with one word.", &history)
        .await
        .unwrap();
    let text = normalize_response(&value);
    assert!(text.to_lowercase().contains("sam"), "{text}");
}
