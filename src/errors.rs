//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

use crate::frame::Status;

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, UplinkError>;

/// Uplink error enumeration covering all client-visible failure modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UplinkError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Stream registration handshake failure.
    Registration(String),
    /// A send exhausted its retry budget without an acknowledgement.
    DeadlineExceeded(String),
    /// The operation is not valid in the stream's current state.
    FailedPrecondition(String),
    /// The stream has already terminated.
    Unavailable(String),
    /// The server acknowledged a send with a non-OK status.
    Ack(Status),
    /// The stream reached a terminal status while the operation was pending.
    Stream(Status),
    /// Frame encoding or transport plumbing failure.
    Io(String),
}

impl Display for UplinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Registration(msg) => write!(f, "registration: {msg}"),
            Self::DeadlineExceeded(msg) => write!(f, "deadline exceeded: {msg}"),
            Self::FailedPrecondition(msg) => write!(f, "failed precondition: {msg}"),
            Self::Unavailable(msg) => write!(f, "unavailable: {msg}"),
            Self::Ack(status) => write!(f, "ack status: {status}"),
            Self::Stream(status) => write!(f, "stream terminated: {status}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for UplinkError {}

impl From<toml::de::Error> for UplinkError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<serde_json::Error> for UplinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Io(format!("frame payload encoding: {err}"))
    }
}
