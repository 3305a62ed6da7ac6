//! Consumed transport surface: a typed full-duplex frame stream.
//!
//! The reactor does not speak any particular RPC runtime. It consumes this
//! minimal abstraction: open a stream with initiation metadata, write one
//! frame at a time on the sending half, read one event at a time on the
//! receiving half. The receiving half reports stream end as a single
//! [`StreamEvent::Closed`] carrying the terminal [`Status`] — a clean peer
//! close arrives as `Closed(Status::ok())`.
//!
//! Implementations back these traits with their transport of choice
//! (an HTTP/2 streaming runtime in production, channel pairs in tests). The
//! contract the reactor relies on:
//!
//! - [`StreamSink::send`] resolving is the write-completion signal; the
//!   reactor never issues a second `send` before the first resolves.
//! - [`StreamSource::recv`] yields frames in wire-arrival order and yields
//!   `Closed` exactly once, after which the reactor stops reading.

use std::future::Future;
use std::pin::Pin;

use crate::frame::{Frame, Status};
use crate::Result;

/// Event produced by the receiving half of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A frame arrived from the peer.
    Frame(Frame),
    /// The stream reached its terminal status; no further frames follow.
    Closed(Status),
}

/// Sending half of an established stream.
pub trait StreamSink: Send {
    /// Write one frame. The returned future resolves when the transport has
    /// accepted the frame and the next write may be issued.
    ///
    /// # Errors
    ///
    /// Returns [`UplinkError::Io`](crate::UplinkError::Io) or
    /// [`UplinkError::Unavailable`](crate::UplinkError::Unavailable) when the
    /// stream is no longer writable. Write errors are not surfaced to
    /// senders directly; the terminal status arrives through the receiving
    /// half.
    fn send(&mut self, frame: Frame) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Signal that no further frames will be written (local half-close).
    fn half_close(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Receiving half of an established stream.
pub trait StreamSource: Send {
    /// Read the next event: a frame, or the terminal status.
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = StreamEvent> + Send + '_>>;
}

/// Both halves of a freshly opened stream.
pub struct StreamHalves {
    /// Sending half, consumed by the reactor's writer task.
    pub sink: Box<dyn StreamSink>,
    /// Receiving half, consumed by the reactor's reader task.
    pub source: Box<dyn StreamSource>,
}

/// Factory for full-duplex frame streams.
pub trait StreamTransport: Send + Sync {
    /// Open a stream, attaching the given initiation metadata.
    ///
    /// # Errors
    ///
    /// Returns [`UplinkError::Unavailable`](crate::UplinkError::Unavailable)
    /// or [`UplinkError::Io`](crate::UplinkError::Io) when the stream cannot
    /// be established.
    fn open(
        &self,
        headers: Vec<(String, String)>,
    ) -> Pin<Box<dyn Future<Output = Result<StreamHalves>> + Send + '_>>;
}
