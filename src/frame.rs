//! Wire data model for the bidirectional agent stream.
//!
//! Each direction of the stream exchanges [`Frame`]s: a tagged union of a
//! payload ([`MessageBody`]) or an acknowledgement ([`Status`]), keyed by an
//! opaque `message_id`. Every payload written in one direction is answered by
//! an ack frame carrying the same `message_id` in the other direction.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status codes carried by acknowledgements and terminal stream statuses.
///
/// Numbering follows the control plane's RPC status space; `Ok` is `0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    /// Success.
    Ok,
    /// Operation cancelled by the peer.
    Cancelled,
    /// Unclassified failure.
    Unknown,
    /// Deadline elapsed before completion.
    DeadlineExceeded,
    /// The peer is shedding load.
    ResourceExhausted,
    /// Operation rejected in the current stream state.
    FailedPrecondition,
    /// Operation aborted by the peer.
    Aborted,
    /// Server-side invariant violation.
    Internal,
    /// The service is temporarily unreachable.
    Unavailable,
}

impl StatusCode {
    /// Numeric wire value for this code.
    #[must_use]
    pub fn value(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Cancelled => 1,
            Self::Unknown => 2,
            Self::DeadlineExceeded => 4,
            Self::ResourceExhausted => 8,
            Self::FailedPrecondition => 9,
            Self::Aborted => 10,
            Self::Internal => 13,
            Self::Unavailable => 14,
        }
    }
}

/// Code-and-message status, used both as ack payload and terminal stream status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Status {
    /// Status code.
    pub code: StatusCode,
    /// Human-readable detail; empty on success.
    #[serde(default)]
    pub message: String,
}

impl Status {
    /// Create a status with the given code and message.
    #[must_use]
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The success status.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            message: String::new(),
        }
    }

    /// Whether this status reports success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{:?} ({})", self.code, self.code.value())
        } else {
            write!(f, "{:?} ({}): {}", self.code, self.code.value(), self.message)
        }
    }
}

/// Payload half of the frame union: opaque bytes plus string-typed metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct MessageBody {
    /// Metadata labels attached to the payload.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Opaque payload bytes.
    #[serde(default)]
    pub payload: Bytes,
}

impl MessageBody {
    /// Create a body from labels and payload bytes.
    #[must_use]
    pub fn new(labels: HashMap<String, String>, payload: Bytes) -> Self {
        Self { labels, payload }
    }

    /// Create an unlabelled body from UTF-8 text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            labels: HashMap::new(),
            payload: Bytes::from(text.into()),
        }
    }

    /// Attach a label, returning the body for chaining.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// View the payload as UTF-8 text, if it is valid UTF-8.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Variant half of a [`Frame`]: payload or acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// A payload delivery.
    Body(MessageBody),
    /// An acknowledgement of a payload sent in the opposite direction.
    Ack(Status),
}

/// One unit of the bidirectional stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Frame {
    /// Opaque message identifier. Unique per outbound payload; an ack carries
    /// the id of the payload it acknowledges.
    pub message_id: String,
    /// Payload or acknowledgement.
    pub kind: FrameKind,
}

impl Frame {
    /// Create a payload frame with a fresh unique `message_id`.
    #[must_use]
    pub fn body(body: MessageBody) -> Self {
        Self::body_with_id(Uuid::new_v4().to_string(), body)
    }

    /// Create a payload frame with a caller-chosen `message_id`.
    #[must_use]
    pub fn body_with_id(message_id: impl Into<String>, body: MessageBody) -> Self {
        Self {
            message_id: message_id.into(),
            kind: FrameKind::Body(body),
        }
    }

    /// Create a success acknowledgement for the given `message_id`.
    #[must_use]
    pub fn ack(message_id: impl Into<String>) -> Self {
        Self::ack_with_status(message_id, Status::ok())
    }

    /// Create an acknowledgement carrying an explicit status.
    #[must_use]
    pub fn ack_with_status(message_id: impl Into<String>, status: Status) -> Self {
        Self {
            message_id: message_id.into(),
            kind: FrameKind::Ack(status),
        }
    }

    /// Whether this frame is a payload.
    #[must_use]
    pub fn is_body(&self) -> bool {
        matches!(self.kind, FrameKind::Body(_))
    }

    /// Whether this frame is an acknowledgement.
    #[must_use]
    pub fn is_ack(&self) -> bool {
        matches!(self.kind, FrameKind::Ack(_))
    }

    /// The payload, when this frame is one.
    #[must_use]
    pub fn as_body(&self) -> Option<&MessageBody> {
        match &self.kind {
            FrameKind::Body(body) => Some(body),
            FrameKind::Ack(_) => None,
        }
    }

    /// The ack status, when this frame is an acknowledgement.
    #[must_use]
    pub fn ack_status(&self) -> Option<&Status> {
        match &self.kind {
            FrameKind::Ack(status) => Some(status),
            FrameKind::Body(_) => None,
        }
    }
}
