//! Route handlers.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::ApiError;
use crate::engine::RequestTracker;
use crate::model::{ChatRequest, ChatTurn, DEFAULT_USER_ID, RequestId, ResultRecord, Status};

/// How many records `/chat/requests` returns.
const RECENT_LIMIT: usize = 10;

/// Body of `POST /chat/async`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncChatRequest {
    pub message: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncChatResponse {
    pub request_id: RequestId,
    pub status: Status,
    pub message: String,
}

pub(super) async fn root() -> Json<Value> {
    Json(json!({
        "message": "Porta Finance Assistant API",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(super) async fn health(State(tracker): State<RequestTracker>) -> Json<Value> {
    match tracker.stats() {
        Ok(stats) => Json(json!({
            "status": "healthy",
            "agent_ready": tracker.executor().is_ready(),
            "async_processing": stats,
        })),
        Err(e) => Json(json!({
            "status": "unhealthy",
            "error": e.to_string(),
        })),
    }
}

pub(super) async fn submit_chat(
    State(tracker): State<RequestTracker>,
    Json(body): Json<AsyncChatRequest>,
) -> Result<Json<AsyncChatResponse>, ApiError> {
    let submitted = tracker.submit(
        ChatRequest::new(body.message)
            .user(body.user_id)
            .history(body.chat_history),
    )?;

    Ok(Json(AsyncChatResponse {
        request_id: submitted.request_id,
        status: submitted.status,
        message: "Request queued for processing".to_string(),
    }))
}

pub(super) async fn request_status(
    State(tracker): State<RequestTracker>,
    Path(request_id): Path<String>,
) -> Result<Json<ResultRecord>, ApiError> {
    let id: RequestId = request_id.parse()?;
    Ok(Json(tracker.status(id)?))
}

pub(super) async fn list_requests(
    State(tracker): State<RequestTracker>,
) -> Result<Json<Value>, ApiError> {
    let stats = tracker.stats()?;
    let recent = tracker.recent(RECENT_LIMIT)?;
    Ok(Json(json!({
        "active_requests": stats.active_requests,
        "queue_size": stats.queue_size,
        "recent_requests": recent,
    })))
}
