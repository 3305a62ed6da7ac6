#![forbid(unsafe_code)]

//! `agent-uplink` — bidirectional message-stream client connecting an
//! on-host agent to its control plane.
//!
//! One full-duplex stream carries both directions: outbound payloads the
//! server acknowledges, and inbound payloads the client acknowledges back.
//! The reactor behind [`UplinkClient`] serializes outbound writes, correlates
//! acknowledgements against pending sends, retries unacknowledged sends with
//! the same `message_id`, delivers every inbound frame to a caller-supplied
//! sink in arrival order, and surfaces the stream's terminal status.
//!
//! The underlying RPC runtime is injected through the [`transport`] traits;
//! the crate itself never dials anything.

pub mod client;
pub mod config;
pub mod errors;
pub mod frame;
pub mod identity;
mod reactor;
pub mod registration;
pub mod transport;

pub use client::{FrameSink, UplinkClient};
pub use config::ClientConfig;
pub use errors::{Result, UplinkError};
pub use frame::{Frame, FrameKind, MessageBody, Status, StatusCode};
pub use identity::ConnectionId;
pub use transport::{StreamEvent, StreamHalves, StreamSink, StreamSource, StreamTransport};
