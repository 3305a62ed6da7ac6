//! Registration handshake frames.
//!
//! The first outbound frame after stream open is a registration request: a
//! distinguished payload announcing the agent's identity. The server answers
//! it with an ack before any other traffic flows; the reactor holds the
//! stream in its registering state until that ack arrives.

use serde::{Deserialize, Serialize};

use crate::frame::{Frame, MessageBody};
use crate::identity::ConnectionId;
use crate::Result;

/// Label key marking a frame's role on the wire.
pub const FRAME_KIND_LABEL: &str = "uplink-frame-kind";

/// Label value marking the registration request.
pub const REGISTER_CONNECTION_KIND: &str = "register-connection";

/// Identity announcement carried in the registration payload bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RegisterConnection {
    /// Resource the agent speaks for.
    pub resource_id: String,
    /// Control-plane channel the agent registers on.
    pub channel_id: String,
}

impl RegisterConnection {
    /// Decode a registration announcement from a frame's payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`UplinkError::Io`](crate::UplinkError::Io) if the payload is
    /// not a valid announcement.
    pub fn from_body(body: &MessageBody) -> Result<Self> {
        Ok(serde_json::from_slice(&body.payload)?)
    }
}

/// Build the registration request frame for the given identity.
///
/// The frame carries a fresh `message_id`, the [`REGISTER_CONNECTION_KIND`]
/// label, and a JSON-encoded [`RegisterConnection`] payload. The credential
/// never appears in the payload; it travels only in the initiation headers.
///
/// # Errors
///
/// Returns [`UplinkError::Io`](crate::UplinkError::Io) if the announcement
/// cannot be encoded.
pub fn registration_frame(identity: &ConnectionId) -> Result<Frame> {
    let announcement = RegisterConnection {
        resource_id: identity.resource_id.clone(),
        channel_id: identity.channel_id.clone(),
    };
    let payload = serde_json::to_vec(&announcement)?;
    let body = MessageBody::new(Default::default(), payload.into())
        .with_label(FRAME_KIND_LABEL, REGISTER_CONNECTION_KIND);
    Ok(Frame::body(body))
}

/// Whether a frame is a registration request.
#[must_use]
pub fn is_registration_frame(frame: &Frame) -> bool {
    frame
        .as_body()
        .and_then(|body| body.labels.get(FRAME_KIND_LABEL))
        .is_some_and(|kind| kind == REGISTER_CONNECTION_KIND)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
