//! HTTP surface over the request tracker.
//!
//! JSON in, JSON out. Errors come back as `{"detail": "..."}` with 404 for
//! unknown requests and 500 for everything else.

mod handlers;

pub use handlers::{AsyncChatRequest, AsyncChatResponse};

use std::future::Future;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::engine::RequestTracker;
use crate::error::{Error, Result};

/// Build the router. CORS is wide open; the API sits behind a frontend.
pub fn router(tracker: RequestTracker) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/chat/async", post(handlers::submit_chat))
        .route("/chat/status/:request_id", get(handlers::request_status))
        .route("/chat/requests", get(handlers::list_requests))
        .layer(CorsLayer::permissive())
        .with_state(tracker)
}

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, tracker: RequestTracker, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "HTTP API listening");
    }
    axum::serve(listener, router(tracker))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Crate errors rendered as HTTP responses.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self.0 {
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "Request not found".to_string()),
            other => {
                tracing::error!(error = %other, "request handling failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}
