//! Core data model.
//!
//! A work item is one submitted chat request. Its result record tracks
//! where it is in the lifecycle and, once terminal, what came out of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// User identifier used when a caller does not supply one.
pub const DEFAULT_USER_ID: &str = "f00dc8bd-eabc-4143-b1f0-fbcb9715a02e";

// ---------------------------------------------------------------------------
// Request ID
// ---------------------------------------------------------------------------

/// Newtype for request IDs. Opaque to callers, unique per submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| Error::NotFound(format!("request {s}")))
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Who said a prior turn. Anything other than user/assistant is carried
/// through deserialization but never forwarded to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

/// One prior turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Keep only the turns the executor understands, in order.
pub fn conversation_history(turns: &[ChatTurn]) -> Vec<ChatTurn> {
    turns
        .iter()
        .filter(|t| matches!(t.role, Role::User | Role::Assistant))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Work Item
// ---------------------------------------------------------------------------

/// A submitted chat request. Immutable once enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: RequestId,
    pub message: String,
    pub user_id: String,
    /// Prior conversation turns, as submitted.
    pub history: Vec<ChatTurn>,
    pub created_at: DateTime<Utc>,
}

/// Builder for chat requests. The tracker's public API for submitting work.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub(crate) message: String,
    pub(crate) user_id: String,
    pub(crate) history: Vec<ChatTurn>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            user_id: DEFAULT_USER_ID.to_string(),
            history: Vec::new(),
        }
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Submitted, waiting for a free slot.
    Queued,
    /// Admitted; the executor is working on it.
    Processing,
    /// Done, response available. Terminal.
    Completed,
    /// Failed, error available. Terminal.
    Error,
}

impl Status {
    /// Can transition from self to `to`?
    pub fn can_transition_to(self, to: Status) -> bool {
        use Status::*;
        matches!(
            (self, to),
            (Queued, Processing) | (Queued, Error) | (Processing, Completed) | (Processing, Error)
        )
    }

    /// Is this a terminal status?
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Queued => "queued",
            Status::Processing => "processing",
            Status::Completed => "completed",
            Status::Error => "error",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Result Record
// ---------------------------------------------------------------------------

/// Status and outcome of one request. Owned by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub request_id: RequestId,
    pub status: Status,
    /// Normalized executor response, set on completion.
    pub response: Option<String>,
    pub user_id: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ResultRecord {
    pub(crate) fn queued(item: &WorkItem) -> Self {
        Self {
            request_id: item.id,
            status: Status::Queued,
            response: None,
            user_id: item.user_id.clone(),
            error: None,
            created_at: item.created_at,
            completed_at: None,
        }
    }
}

/// What the caller gets back from a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Submitted {
    pub request_id: RequestId,
    pub status: Status,
}

/// Point-in-time view of the tracker's load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Items waiting for admission.
    pub queue_size: usize,
    /// Items admitted and not yet released.
    pub active_requests: usize,
    /// Result records currently held.
    pub stored_requests: usize,
    pub max_concurrent: usize,
}
