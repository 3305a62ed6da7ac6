//! Unit tests for `ClientConfig` defaults, TOML loading, and validation.

use std::time::Duration;

use agent_uplink::{ClientConfig, UplinkError};

#[test]
fn defaults_pin_the_retry_contract() {
    let config = ClientConfig::default();
    assert_eq!(config.send_attempts, 5);
    assert_eq!(config.ack_timeout_ms, 500);
    assert_eq!(config.registration_timeout_ms, 10_000);

    // Five attempts fit inside one three-second server window.
    assert!(config.ack_timeout() * config.send_attempts <= Duration::from_secs(3));
}

#[test]
fn from_toml_str_overrides_and_fills_defaults() {
    let config = ClientConfig::from_toml_str("ack_timeout_ms = 250\n").expect("parse");
    assert_eq!(config.ack_timeout_ms, 250);
    assert_eq!(config.send_attempts, 5);
    assert_eq!(config.registration_timeout_ms, 10_000);
}

#[test]
fn from_toml_str_rejects_malformed_input() {
    let err = ClientConfig::from_toml_str("send_attempts = \"many\"").expect_err("must fail");
    assert!(matches!(err, UplinkError::Config(_)));
}

#[test]
fn validate_rejects_zero_fields() {
    let err = ClientConfig::from_toml_str("send_attempts = 0").expect_err("must fail");
    assert!(matches!(err, UplinkError::Config(_)));

    let err = ClientConfig::from_toml_str("ack_timeout_ms = 0").expect_err("must fail");
    assert!(matches!(err, UplinkError::Config(_)));

    let err = ClientConfig::from_toml_str("registration_timeout_ms = 0").expect_err("must fail");
    assert!(matches!(err, UplinkError::Config(_)));
}

#[test]
fn from_toml_path_reads_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("uplink.toml");
    std::fs::write(&path, "send_attempts = 3\nack_timeout_ms = 1000\n").expect("write");

    let config = ClientConfig::from_toml_path(&path).expect("load");
    assert_eq!(config.send_attempts, 3);
    assert_eq!(config.ack_timeout(), Duration::from_secs(1));
}

#[test]
fn from_toml_path_surfaces_missing_file_as_io() {
    let err = ClientConfig::from_toml_path(std::path::Path::new("/nonexistent/uplink.toml"))
        .expect_err("must fail");
    assert!(matches!(err, UplinkError::Io(_)));
}
