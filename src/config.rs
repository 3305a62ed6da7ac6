//! Client tuning configuration: retry budget, ack and registration deadlines.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{Result, UplinkError};

/// Tunable parameters for a single uplink client.
///
/// All fields have contract-preserving defaults: five send attempts with a
/// half-second per-attempt ack deadline, and a ten-second registration
/// deadline. Embedding processes that load their settings from TOML can
/// deserialize this struct directly or use [`ClientConfig::from_toml_str`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    /// Total attempts per `send_message`, including the first.
    #[serde(default = "default_send_attempts")]
    pub send_attempts: u32,
    /// Per-attempt deadline for receiving an ack after a payload is queued.
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
    /// Deadline for the registration ack after the stream opens.
    #[serde(default = "default_registration_timeout_ms")]
    pub registration_timeout_ms: u64,
}

fn default_send_attempts() -> u32 {
    5
}

fn default_ack_timeout_ms() -> u64 {
    500
}

fn default_registration_timeout_ms() -> u64 {
    10_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            send_attempts: default_send_attempts(),
            ack_timeout_ms: default_ack_timeout_ms(),
            registration_timeout_ms: default_registration_timeout_ms(),
        }
    }
}

impl ClientConfig {
    /// Parse a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`UplinkError::Config`] if the TOML is malformed or a field
    /// fails [`ClientConfig::validate`].
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`UplinkError::Io`] if the file cannot be read, or
    /// [`UplinkError::Config`] on parse/validation failure.
    pub fn from_toml_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| UplinkError::Io(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Validate field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`UplinkError::Config`] if any field is zero.
    pub fn validate(&self) -> Result<()> {
        if self.send_attempts == 0 {
            return Err(UplinkError::Config(
                "send_attempts must be at least 1".into(),
            ));
        }
        if self.ack_timeout_ms == 0 {
            return Err(UplinkError::Config("ack_timeout_ms must be non-zero".into()));
        }
        if self.registration_timeout_ms == 0 {
            return Err(UplinkError::Config(
                "registration_timeout_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Per-attempt ack deadline as a [`Duration`].
    #[must_use]
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    /// Registration deadline as a [`Duration`].
    #[must_use]
    pub fn registration_timeout(&self) -> Duration {
        Duration::from_millis(self.registration_timeout_ms)
    }
}
