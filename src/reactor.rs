//! Single-stream client reactor.
//!
//! Owns one full-duplex stream end to end: serializes outbound writes through
//! a FIFO queue consumed by a dedicated writer task, dispatches inbound
//! frames into acknowledgements (correlated against the pending-send table)
//! and payload deliveries (forwarded to the user sink, then acked), retries
//! unacknowledged sends up to the configured attempt budget with the same
//! `message_id`, and fans the stream's terminal status out to every waiter.
//!
//! # State machine
//!
//! `Init → Registering → Running → Draining → Terminated`
//!
//! The stream enters `Registering` as soon as it opens and moves to `Running`
//! once the registration ack arrives. A local half-close moves it to
//! `Draining` (the writer finishes the queue, then half-closes); the terminal
//! status observed by the reader moves it to `Terminated`.
//!
//! # Locking
//!
//! One mutex guards the queue, the writer-idle flag, the pending-send table,
//! and the state. It is held for bookkeeping only — never across a transport
//! call or a user-sink invocation.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{oneshot, watch, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::FrameSink;
use crate::config::ClientConfig;
use crate::frame::{Frame, MessageBody, Status, StatusCode};
use crate::identity::ConnectionId;
use crate::registration;
use crate::transport::{StreamEvent, StreamSink, StreamSource, StreamTransport};
use crate::{Result, UplinkError};

/// Reactor lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReactorState {
    /// Stream created, not yet started.
    Init,
    /// Registration request written; awaiting its ack.
    Registering,
    /// Normal bidirectional exchange.
    Running,
    /// Local half-close issued; in-flight traffic still delivered.
    Draining,
    /// Terminal stream status captured.
    Terminated,
}

/// Resolution delivered through a pending send's completion signal.
enum SendOutcome {
    /// The server acknowledged the payload with this status.
    Ack(Status),
    /// The stream terminated with this status before the ack arrived.
    Terminated(Status),
}

/// One outbound payload awaiting acknowledgement.
struct PendingSend {
    /// Resend budget left after the attempt currently in flight.
    retries_remaining: u32,
    /// Targeted wakeup for the blocked `send_message` caller.
    ack_tx: oneshot::Sender<SendOutcome>,
}

/// Mutable reactor bookkeeping, all under the one lock.
struct Inner {
    state: ReactorState,
    /// FIFO of frames awaiting transmission (payloads and acks).
    queue: VecDeque<Frame>,
    /// Set when the writer has no frame in flight and the queue is empty.
    writer_idle: bool,
    /// Pending sends keyed by `message_id`.
    pending: HashMap<String, PendingSend>,
    /// Terminal status, once captured.
    terminal: Option<Status>,
}

/// State shared between the facade and the reactor's tasks.
struct Shared {
    inner: Mutex<Inner>,
    /// Wakes the writer task when the queue gains a frame or the state moves.
    writer_wake: Notify,
    /// Publishes the terminal status to `await_reactor` callers.
    terminal_tx: watch::Sender<Option<Status>>,
    /// Tears down both tasks on termination or drop.
    cancel: CancellationToken,
    /// Caller-supplied sink observing every inbound frame.
    sink: FrameSink,
    config: ClientConfig,
}

impl Shared {
    /// The lock is only ever held over collection bookkeeping; a poisoning
    /// panic cannot leave the state half-updated, so recover the guard.
    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Wake the writer only when it is parked on an empty queue. A busy
    /// writer re-checks the queue under the lock before parking, so a frame
    /// enqueued while it writes is never missed.
    fn wake_writer_if_idle(&self) {
        let idle = self.lock_inner().writer_idle;
        if idle {
            self.writer_wake.notify_one();
        }
    }

    /// Capture the terminal status, fail every pending send with it, clear
    /// the queue, and wake everything that is waiting. Idempotent.
    fn terminate(&self, status: Status) {
        let waiters: Vec<PendingSend> = {
            let mut inner = self.lock_inner();
            if inner.state == ReactorState::Terminated {
                return;
            }
            inner.state = ReactorState::Terminated;
            inner.terminal = Some(status.clone());
            inner.queue.clear();
            inner.writer_idle = true;
            inner.pending.drain().map(|(_, pending)| pending).collect()
        };

        let unblocked = waiters.len();
        for waiter in waiters {
            let _ = waiter.ack_tx.send(SendOutcome::Terminated(status.clone()));
        }
        self.cancel.cancel();
        self.terminal_tx.send_replace(Some(status.clone()));
        info!(%status, unblocked, "uplink reactor: stream terminated");
    }
}

/// The single-stream state machine. Exclusively owned by the client facade;
/// its writer and reader tasks share the internal state only.
pub(crate) struct ReactorCore {
    shared: Arc<Shared>,
}

impl ReactorCore {
    /// Open the stream with the identity's initiation headers, start the
    /// writer and reader tasks, send the registration request, and wait for
    /// its acknowledgement.
    pub(crate) async fn start(
        transport: Arc<dyn StreamTransport>,
        identity: &ConnectionId,
        config: ClientConfig,
        sink: FrameSink,
    ) -> Result<Self> {
        config.validate()?;

        let halves = transport.open(identity.initiation_headers()).await?;
        let registration_timeout = config.registration_timeout();

        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                state: ReactorState::Init,
                queue: VecDeque::new(),
                writer_idle: true,
                pending: HashMap::new(),
                terminal: None,
            }),
            writer_wake: Notify::new(),
            terminal_tx: watch::Sender::new(None),
            cancel: CancellationToken::new(),
            sink,
            config,
        });

        let frame = registration::registration_frame(identity)?;
        let message_id = frame.message_id.clone();
        let (ack_tx, ack_rx) = oneshot::channel();
        {
            let mut inner = shared.lock_inner();
            inner.state = ReactorState::Registering;
            inner.pending.insert(
                message_id.clone(),
                PendingSend {
                    retries_remaining: 0,
                    ack_tx,
                },
            );
            inner.queue.push_back(frame);
        }
        shared.wake_writer_if_idle();
        debug!(message_id = %message_id, "uplink reactor: registration request queued");

        tokio::spawn(run_writer(Arc::clone(&shared), halves.sink));
        tokio::spawn(run_reader(Arc::clone(&shared), halves.source));

        let core = Self { shared };
        match tokio::time::timeout(registration_timeout, ack_rx).await {
            Ok(Ok(SendOutcome::Ack(status))) if status.is_ok() => {
                {
                    let mut inner = core.shared.lock_inner();
                    if inner.state == ReactorState::Registering {
                        inner.state = ReactorState::Running;
                    }
                }
                info!("uplink reactor: registration acknowledged, stream running");
                Ok(core)
            }
            Ok(Ok(SendOutcome::Ack(status))) => {
                core.shared.terminate(status.clone());
                Err(UplinkError::Registration(format!(
                    "registration rejected: {status}"
                )))
            }
            Ok(Ok(SendOutcome::Terminated(status))) => Err(UplinkError::Registration(format!(
                "stream terminated during registration: {status}"
            ))),
            Ok(Err(_)) => Err(UplinkError::Registration(
                "reactor shut down during registration".into(),
            )),
            Err(_) => {
                let status = Status::new(StatusCode::DeadlineExceeded, "registration ack not received");
                core.shared.terminate(status.clone());
                Err(UplinkError::Registration(format!(
                    "registration timed out: {status}"
                )))
            }
        }
    }

    /// Send one payload and block until the server acknowledges it.
    ///
    /// Each attempt waits up to the configured ack timeout; on expiry the
    /// same frame — same `message_id`, same payload bytes — is re-enqueued,
    /// up to the configured attempt budget.
    pub(crate) async fn send_message(&self, body: MessageBody) -> Result<()> {
        let frame = Frame::body(body);
        let message_id = frame.message_id.clone();
        let attempts = self.shared.config.send_attempts;
        let (ack_tx, mut ack_rx) = oneshot::channel();

        {
            let mut inner = self.shared.lock_inner();
            match inner.state {
                ReactorState::Running => {}
                ReactorState::Terminated => {
                    let status = terminal_status(&inner);
                    return Err(UplinkError::Unavailable(format!(
                        "stream terminated: {status}"
                    )));
                }
                ReactorState::Draining => {
                    return Err(UplinkError::FailedPrecondition(
                        "stream is half-closed".into(),
                    ));
                }
                ReactorState::Init | ReactorState::Registering => {
                    return Err(UplinkError::FailedPrecondition(
                        "stream not registered".into(),
                    ));
                }
            }
            inner.pending.insert(
                message_id.clone(),
                PendingSend {
                    retries_remaining: attempts - 1,
                    ack_tx,
                },
            );
            inner.queue.push_back(frame.clone());
        }
        self.shared.wake_writer_if_idle();
        debug!(message_id = %message_id, "uplink reactor: payload queued");

        let ack_timeout = self.shared.config.ack_timeout();
        loop {
            match tokio::time::timeout(ack_timeout, &mut ack_rx).await {
                Ok(Ok(SendOutcome::Ack(status))) => {
                    return if status.is_ok() {
                        Ok(())
                    } else {
                        Err(UplinkError::Ack(status))
                    };
                }
                Ok(Ok(SendOutcome::Terminated(status))) => {
                    return Err(UplinkError::Stream(status));
                }
                Ok(Err(_)) => {
                    return Err(UplinkError::Unavailable("reactor shut down".into()));
                }
                Err(_) => match self.on_ack_deadline(&frame) {
                    DeadlineStep::Resend(remaining) => {
                        warn!(
                            message_id = %message_id,
                            remaining, "uplink reactor: ack deadline elapsed, resending"
                        );
                    }
                    DeadlineStep::Exhausted => {
                        warn!(message_id = %message_id, attempts, "uplink reactor: retry budget exhausted");
                        return Err(UplinkError::DeadlineExceeded(format!(
                            "no ack for message {message_id} after {attempts} attempts"
                        )));
                    }
                    // The ack raced the deadline; its outcome is already on
                    // the completion signal.
                    DeadlineStep::Resolved => {}
                },
            }
        }
    }

    /// Enqueue a caller-constructed frame verbatim, without waiting for an
    /// acknowledgement. Any ack the server emits flows only to the user sink.
    pub(crate) fn add_request(&self, frame: Frame) -> Result<()> {
        let message_id = frame.message_id.clone();
        {
            let mut inner = self.shared.lock_inner();
            if inner.state == ReactorState::Terminated {
                let status = terminal_status(&inner);
                return Err(UplinkError::Unavailable(format!(
                    "stream terminated: {status}"
                )));
            }
            inner.queue.push_back(frame);
        }
        self.shared.wake_writer_if_idle();
        debug!(message_id = %message_id, "uplink reactor: request queued");
        Ok(())
    }

    /// Block until the reactor reaches its terminal state and return the
    /// captured stream status.
    pub(crate) async fn await_reactor(&self) -> Status {
        let mut rx = self.shared.terminal_tx.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(status) = current {
                return status;
            }
            if rx.changed().await.is_err() {
                return Status::new(StatusCode::Unknown, "reactor dropped before termination");
            }
        }
    }

    /// Issue a local half-close: the writer finishes the outbound queue and
    /// then signals end of writes. Inbound delivery continues until the peer
    /// closes its side.
    pub(crate) fn close(&self) {
        {
            let mut inner = self.shared.lock_inner();
            match inner.state {
                ReactorState::Init | ReactorState::Registering | ReactorState::Running => {
                    inner.state = ReactorState::Draining;
                }
                ReactorState::Draining | ReactorState::Terminated => return,
            }
        }
        self.shared.writer_wake.notify_one();
        info!("uplink reactor: local half-close requested");
    }

    /// Handle an elapsed ack deadline for `frame`.
    fn on_ack_deadline(&self, frame: &Frame) -> DeadlineStep {
        let mut inner = self.shared.lock_inner();
        let step = match inner.pending.get_mut(&frame.message_id) {
            None => DeadlineStep::Resolved,
            Some(pending) if pending.retries_remaining > 0 => {
                pending.retries_remaining -= 1;
                DeadlineStep::Resend(pending.retries_remaining)
            }
            Some(_) => DeadlineStep::Exhausted,
        };
        match step {
            DeadlineStep::Resend(_) => {
                inner.queue.push_back(frame.clone());
                drop(inner);
                self.shared.wake_writer_if_idle();
            }
            DeadlineStep::Exhausted => {
                inner.pending.remove(&frame.message_id);
            }
            DeadlineStep::Resolved => {}
        }
        step
    }
}

impl Drop for ReactorCore {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

/// Outcome of an elapsed per-attempt ack deadline.
#[derive(Clone, Copy)]
enum DeadlineStep {
    /// Same frame re-enqueued; this many retries remain afterwards.
    Resend(u32),
    /// Retry budget exhausted; the pending record is gone.
    Exhausted,
    /// An ack or termination resolved the send between expiry and lookup.
    Resolved,
}

/// Terminal status recorded in `inner`, or a placeholder if termination has
/// not filled it in.
fn terminal_status(inner: &Inner) -> Status {
    inner
        .terminal
        .clone()
        .unwrap_or_else(|| Status::new(StatusCode::Unknown, "stream terminated"))
}

// ── Writer task ───────────────────────────────────────────────────────────────

/// Next action for the writer task.
enum WriterStep {
    /// Write this frame; at most one write is ever in flight.
    Write(Frame),
    /// Queue empty: wait for a wakeup.
    Park,
    /// Queue drained while draining: signal end of writes.
    HalfClose,
    /// Reactor terminated.
    Stop,
}

/// Consumes the outbound FIFO one frame at a time. The `send` future
/// resolving is the write-completion signal; only then is the next frame
/// popped, so writes never overlap on the transport.
async fn run_writer(shared: Arc<Shared>, mut sink: Box<dyn StreamSink>) {
    loop {
        let step = {
            let mut inner = shared.lock_inner();
            if inner.state == ReactorState::Terminated {
                WriterStep::Stop
            } else {
                match inner.queue.pop_front() {
                    Some(frame) => {
                        inner.writer_idle = false;
                        WriterStep::Write(frame)
                    }
                    None => {
                        inner.writer_idle = true;
                        if inner.state == ReactorState::Draining {
                            WriterStep::HalfClose
                        } else {
                            WriterStep::Park
                        }
                    }
                }
            }
        };

        match step {
            WriterStep::Write(frame) => {
                let message_id = frame.message_id.clone();
                if let Err(err) = sink.send(frame).await {
                    // The terminal status reaches the caller via the read
                    // path; the writer just stops consuming.
                    warn!(message_id = %message_id, %err, "uplink writer: write failed, stopping");
                    break;
                }
                debug!(message_id = %message_id, "uplink writer: frame written");
            }
            WriterStep::Park => {
                tokio::select! {
                    biased;

                    () = shared.cancel.cancelled() => break,
                    () = shared.writer_wake.notified() => {}
                }
            }
            WriterStep::HalfClose => {
                sink.half_close().await;
                debug!("uplink writer: queue drained, half-closed");
                break;
            }
            WriterStep::Stop => break,
        }
    }
}

// ── Reader task ───────────────────────────────────────────────────────────────

/// Keeps one read armed on the stream and dispatches every inbound frame
/// until the terminal status arrives or the reactor is torn down.
async fn run_reader(shared: Arc<Shared>, mut source: Box<dyn StreamSource>) {
    loop {
        let event = tokio::select! {
            biased;

            () = shared.cancel.cancelled() => break,
            event = source.recv() => event,
        };

        match event {
            StreamEvent::Frame(frame) => dispatch_inbound(&shared, frame),
            StreamEvent::Closed(status) => {
                debug!(%status, "uplink reader: stream closed");
                shared.terminate(status);
                break;
            }
        }
    }
}

/// Dispatch one inbound frame: acks resolve their pending send, payloads are
/// acked back. Every frame is forwarded to the user sink first, in arrival
/// order, outside the reactor lock.
fn dispatch_inbound(shared: &Shared, frame: Frame) {
    let message_id = frame.message_id.clone();

    if let Some(status) = frame.ack_status().cloned() {
        (shared.sink)(frame);
        let waiter = {
            let mut inner = shared.lock_inner();
            inner.pending.remove(&message_id)
        };
        match waiter {
            Some(pending) => {
                debug!(message_id = %message_id, %status, "uplink reader: ack correlated");
                let _ = pending.ack_tx.send(SendOutcome::Ack(status));
            }
            None => {
                debug!(message_id = %message_id, "uplink reader: late ack dropped from pending table");
            }
        }
    } else {
        (shared.sink)(frame);
        {
            let mut inner = shared.lock_inner();
            if inner.state == ReactorState::Terminated {
                return;
            }
            inner.queue.push_back(Frame::ack(message_id.clone()));
        }
        shared.wake_writer_if_idle();
        debug!(message_id = %message_id, "uplink reader: payload delivered, ack queued");
    }
}
