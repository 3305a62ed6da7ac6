//! Public client surface over the stream reactor.

use std::sync::Arc;

use tracing::debug;

use crate::config::ClientConfig;
use crate::frame::{Frame, MessageBody, Status};
use crate::identity::ConnectionId;
use crate::reactor::ReactorCore;
use crate::transport::StreamTransport;
use crate::Result;

/// Caller-supplied sink invoked once per inbound frame, in stream-arrival
/// order, from the reactor's read task.
///
/// The sink observes both payload deliveries and acknowledgements (including
/// the registration ack and late acks whose send has already given up). It is
/// always invoked without any reactor lock held.
///
/// # Reentrancy
///
/// The sink runs on the read task. Blocking inside it stalls inbound
/// delivery, and waiting on [`UplinkClient::send_message`] of the same client
/// from the sink is a self-wait: the ack that would unblock the send is
/// behind the sink call. [`UplinkClient::add_request`] is safe to call from
/// the sink — it only enqueues.
pub type FrameSink = Arc<dyn Fn(Frame) + Send + Sync>;

/// Agent communication client over one full-duplex stream.
///
/// Created by [`UplinkClient::create`], which opens the stream, forwards the
/// [`ConnectionId`] initiation headers, and completes the registration
/// handshake before returning. The client exclusively owns its reactor; when
/// the client is dropped the reactor's tasks are torn down.
pub struct UplinkClient {
    reactor: ReactorCore,
}

impl std::fmt::Debug for UplinkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UplinkClient").finish()
    }
}

impl UplinkClient {
    /// Open a stream on `transport`, register `connection_id`, and return a
    /// ready client.
    ///
    /// Blocks until the control plane acknowledges the registration request
    /// or the registration deadline elapses.
    ///
    /// # Errors
    ///
    /// - [`UplinkError::Config`](crate::UplinkError::Config) if `config`
    ///   fails validation.
    /// - [`UplinkError::Registration`](crate::UplinkError::Registration) if
    ///   the stream cannot be established or the registration ack does not
    ///   arrive in time; the transport status is carried in the message.
    pub async fn create(
        transport: Arc<dyn StreamTransport>,
        connection_id: ConnectionId,
        config: ClientConfig,
        sink: FrameSink,
    ) -> Result<Self> {
        debug!(
            resource_id = %connection_id.resource_id,
            channel_id = %connection_id.channel_id,
            "uplink client: creating stream"
        );
        let reactor = ReactorCore::start(transport, &connection_id, config, sink).await?;
        Ok(Self { reactor })
    }

    /// Send one payload and block until the server acknowledges it.
    ///
    /// The payload is assigned a fresh `message_id`. Each attempt waits up to
    /// the configured ack timeout; an unacknowledged attempt is retried with
    /// the identical frame up to the configured attempt budget.
    ///
    /// # Errors
    ///
    /// - [`UplinkError::DeadlineExceeded`](crate::UplinkError::DeadlineExceeded)
    ///   after the attempt budget is exhausted without an ack.
    /// - [`UplinkError::Ack`](crate::UplinkError::Ack) if the server
    ///   acknowledged with a non-OK status.
    /// - [`UplinkError::Stream`](crate::UplinkError::Stream) if the stream
    ///   terminated while the send was pending.
    /// - [`UplinkError::Unavailable`](crate::UplinkError::Unavailable) /
    ///   [`UplinkError::FailedPrecondition`](crate::UplinkError::FailedPrecondition)
    ///   if the stream is already terminated or half-closed.
    pub async fn send_message(&self, body: MessageBody) -> Result<()> {
        self.reactor.send_message(body).await
    }

    /// Enqueue a caller-constructed frame without waiting for an ack.
    ///
    /// The frame is transmitted verbatim — the caller chose the
    /// `message_id`. Returns as soon as the frame is queued; any ack the
    /// server emits for it is visible only through the sink.
    ///
    /// # Errors
    ///
    /// Returns [`UplinkError::Unavailable`](crate::UplinkError::Unavailable)
    /// if the stream has terminated.
    pub fn add_request(&self, frame: Frame) -> Result<()> {
        self.reactor.add_request(frame)
    }

    /// Block until the stream reaches its terminal state and return the
    /// captured status.
    pub async fn await_reactor(&self) -> Status {
        self.reactor.await_reactor().await
    }

    /// Issue a graceful local half-close.
    ///
    /// Frames already queued are still written, then the writer signals end
    /// of writes. Inbound frames keep flowing to the sink until the peer
    /// closes its side; [`UplinkClient::await_reactor`] observes the final
    /// status.
    pub fn close(&self) {
        self.reactor.close();
    }
}
