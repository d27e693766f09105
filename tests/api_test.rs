//! HTTP API tests against a server bound on an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use porta_rs::api::{self, AsyncChatResponse};
use porta_rs::engine::{RequestTracker, TrackerConfig};
use porta_rs::error::{Error, Result};
use porta_rs::executor::{LazyExecutor, WorkExecutor};
use porta_rs::model::{ChatTurn, ResultRecord, Status};
use serde_json::{Value, json};

struct Echo;

#[async_trait]
impl WorkExecutor for Echo {
    async fn execute(&self, message: &str, history: &[ChatTurn]) -> Result<Value> {
        if message == "fail" {
            return Err(Error::Executor("upstream unavailable".to_string()));
        }
        Ok(json!([{"type": "text", "text": format!("{message} ({} prior)", history.len())}]))
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(executor: LazyExecutor) -> Self {
        let tracker = RequestTracker::new(
            Arc::new(executor),
            TrackerConfig {
                max_concurrent: 2,
                capacity: 20,
                poll_interval: Duration::from_millis(10),
                error_backoff: Duration::from_millis(50),
            },
        );
        let admission = tracker.clone();
        tokio::spawn(async move { admission.run().await });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(api::serve(listener, tracker, std::future::pending()));

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn submit(&self, body: Value) -> AsyncChatResponse {
        let resp = self
            .client
            .post(self.url("/chat/async"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }

    async fn wait_terminal(&self, request_id: &str) -> ResultRecord {
        for _ in 0..200 {
            let resp = self
                .client
                .get(self.url(&format!("/chat/status/{request_id}")))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200);
            let record: ResultRecord = resp.json().await.unwrap();
            if record.status.is_terminal() {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("request {request_id} never finished");
    }
}

fn echo() -> LazyExecutor {
    LazyExecutor::ready(Arc::new(Echo))
}

#[tokio::test]
async fn root_reports_running() {
    let server = TestServer::start(echo()).await;
    let body: Value = server
        .client
        .get(server.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "running");
    assert_eq!(body["message"], "Porta Finance Assistant API");
}

#[tokio::test]
async fn async_chat_round_trip() {
    let server = TestServer::start(echo()).await;

    let queued = server
        .submit(json!({
            "message": "list my portfolio",
            "user_id": "user-7",
            "chat_history": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"}
            ]
        }))
        .await;
    assert_eq!(queued.status, Status::Queued);
    assert_eq!(queued.message, "Request queued for processing");

    let record = server.wait_terminal(&queued.request_id.to_string()).await;
    assert_eq!(record.status, Status::Completed);
    assert_eq!(record.response.as_deref(), Some("list my portfolio (2 prior)"));
    assert_eq!(record.user_id, "user-7");
    assert!(record.completed_at.is_some());
}

#[tokio::test]
async fn status_json_uses_null_for_pending_fields() {
    // Executor never builds, but the record is still readable while queued
    // or after it fails.
    let server = TestServer::start(LazyExecutor::new(|| {
        Err(Error::Config("ANTHROPIC_API_KEY not set".to_string()))
    }))
    .await;

    let queued = server.submit(json!({"message": "hi"})).await;
    let record = server.wait_terminal(&queued.request_id.to_string()).await;
    assert_eq!(record.status, Status::Error);
    assert!(record.response.is_none());
    assert!(record.error.unwrap().starts_with("AI agent not ready"));

    let raw: Value = server
        .client
        .get(server.url(&format!("/chat/status/{}", queued.request_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(raw["response"].is_null());
    assert_eq!(raw["status"], "error");
    assert_eq!(raw["user_id"], porta_rs::model::DEFAULT_USER_ID);
}

#[tokio::test]
async fn executor_failure_shows_up_in_status() {
    let server = TestServer::start(echo()).await;
    let queued = server.submit(json!({"message": "fail"})).await;

    let record = server.wait_terminal(&queued.request_id.to_string()).await;
    assert_eq!(record.status, Status::Error);
    assert!(record.error.unwrap().contains("upstream unavailable"));
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_404() {
    let server = TestServer::start(echo()).await;

    for id in [uuid::Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let resp = server
            .client
            .get(server.url(&format!("/chat/status/{id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["detail"], "Request not found");
    }
}

#[tokio::test]
async fn missing_message_is_rejected() {
    let server = TestServer::start(echo()).await;
    let resp = server
        .client
        .post(server.url("/chat/async"))
        .json(&json!({"user_id": "nobody"}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn health_and_request_listing_reflect_tracker_state() {
    let server = TestServer::start(echo()).await;

    let health: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["agent_ready"], true);
    assert_eq!(health["async_processing"]["max_concurrent"], 2);

    let mut last = String::new();
    for i in 0..12 {
        let queued = server.submit(json!({"message": format!("m{i}")})).await;
        last = queued.request_id.to_string();
    }
    server.wait_terminal(&last).await;

    let listing: Value = server
        .client
        .get(server.url("/chat/requests"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let recent = listing["recent_requests"].as_array().unwrap();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[9]["request_id"], last);
    assert!(listing["active_requests"].as_u64().unwrap() <= 2);
}
