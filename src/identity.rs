//! Connection identity forwarded as stream-initiation metadata.

use serde::{Deserialize, Serialize};

/// Metadata key carrying the agent's resource identifier.
pub const RESOURCE_ID_HEADER: &str = "agent-uplink-resource-id";

/// Metadata key carrying the control-plane channel identifier.
pub const CHANNEL_ID_HEADER: &str = "agent-uplink-channel-id";

/// Metadata key carrying the bearer credential, when one is present.
pub const AUTHENTICATION_HEADER: &str = "authentication";

/// Opaque carrier of identification and routing metadata.
///
/// The client core never interprets these fields; they are derived into
/// stream-initiation headers and forwarded verbatim when the stream opens.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ConnectionId {
    /// Resource the agent speaks for (e.g. an instance path).
    pub resource_id: String,
    /// Control-plane channel the agent registers on.
    pub channel_id: String,
    /// Bearer credential for the stream, acquired by the embedding process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ConnectionId {
    /// Create an identity without a credential.
    #[must_use]
    pub fn new(resource_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            channel_id: channel_id.into(),
            token: None,
        }
    }

    /// Attach a bearer credential, returning the identity for chaining.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Derive the stream-initiation headers for this identity.
    ///
    /// Always emits the resource and channel headers; the authentication
    /// header is added only when a token is present.
    #[must_use]
    pub fn initiation_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            (RESOURCE_ID_HEADER.to_owned(), self.resource_id.clone()),
            (CHANNEL_ID_HEADER.to_owned(), self.channel_id.clone()),
        ];
        if let Some(token) = &self.token {
            headers.push((AUTHENTICATION_HEADER.to_owned(), format!("Bearer {token}")));
        }
        headers
    }
}
