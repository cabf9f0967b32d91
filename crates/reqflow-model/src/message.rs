//! Inter-worker messages
//!
//! A [`Message`] is the only unit of communication between the supervisor
//! and workers. Messages are immutable once created and owned by the
//! workflow state's append-only log. Every result/error carries a
//! `reply_to` pointing at the task it answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

/// Unique message identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Ulid);

impl MessageId {
    /// Generate new message ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Work dispatched to a worker
    Task,
    /// Successful worker output
    Result,
    /// Worker failure converted at the worker boundary
    Error,
}

/// Immutable unit of inter-worker communication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique id
    pub id: MessageId,
    /// Sender name ("supervisor" or a worker role tag)
    pub from_worker: String,
    /// Recipient name
    pub to_worker: String,
    /// Task, result or error
    pub kind: MessageKind,
    /// Opaque worker-specific payload
    pub content: Value,
    /// For results/errors: the task message being answered
    pub reply_to: Option<MessageId>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a task message
    #[must_use]
    pub fn task(from: impl Into<String>, to: impl Into<String>, content: Value) -> Self {
        Self {
            id: MessageId::new(),
            from_worker: from.into(),
            to_worker: to.into(),
            kind: MessageKind::Task,
            content,
            reply_to: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a result message answering `reply_to`
    #[must_use]
    pub fn result(
        from: impl Into<String>,
        to: impl Into<String>,
        reply_to: MessageId,
        content: Value,
    ) -> Self {
        Self {
            id: MessageId::new(),
            from_worker: from.into(),
            to_worker: to.into(),
            kind: MessageKind::Result,
            content,
            reply_to: Some(reply_to),
            timestamp: Utc::now(),
        }
    }

    /// Create an error message answering `reply_to`
    #[must_use]
    pub fn error(
        from: impl Into<String>,
        to: impl Into<String>,
        reply_to: MessageId,
        content: Value,
    ) -> Self {
        Self {
            id: MessageId::new(),
            from_worker: from.into(),
            to_worker: to.into(),
            kind: MessageKind::Error,
            content,
            reply_to: Some(reply_to),
            timestamp: Utc::now(),
        }
    }

    /// Whether this message reports a worker failure
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }

    /// Error description carried by an error message, if any
    #[must_use]
    pub fn error_text(&self) -> Option<&str> {
        if self.is_error() {
            self.content.get("error").and_then(Value::as_str)
        } else {
            None
        }
    }
}
