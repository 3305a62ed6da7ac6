//! Unit tests for the wire data model.

use agent_uplink::{Frame, MessageBody, Status, StatusCode};

#[test]
fn payload_frames_get_unique_message_ids() {
    let first = Frame::body(MessageBody::from_text("a"));
    let second = Frame::body(MessageBody::from_text("a"));
    assert_ne!(first.message_id, second.message_id);
    assert!(first.is_body());
    assert!(!first.is_ack());
}

#[test]
fn caller_chosen_ids_are_kept_verbatim() {
    let frame = Frame::body_with_id("fixed-id", MessageBody::from_text("a"));
    assert_eq!(frame.message_id, "fixed-id");
}

#[test]
fn acks_default_to_success() {
    let frame = Frame::ack("msg-1");
    assert_eq!(frame.message_id, "msg-1");
    let status = frame.ack_status().expect("ack");
    assert!(status.is_ok());
    assert_eq!(status.code.value(), 0);
    assert!(frame.as_body().is_none());
}

#[test]
fn ack_with_status_carries_the_status_unchanged() {
    let frame = Frame::ack_with_status("msg-2", Status::new(StatusCode::Aborted, "races"));
    let status = frame.ack_status().expect("ack");
    assert_eq!(status.code, StatusCode::Aborted);
    assert_eq!(status.message, "races");
    assert!(!status.is_ok());
}

#[test]
fn body_text_requires_valid_utf8() {
    let text = MessageBody::from_text("hello");
    assert_eq!(text.text(), Some("hello"));

    let binary = MessageBody::new(Default::default(), bytes::Bytes::from_static(&[0xff, 0xfe]));
    assert_eq!(binary.text(), None);
}

#[test]
fn labels_accumulate_through_with_label() {
    let body = MessageBody::from_text("x")
        .with_label("kind", "test")
        .with_label("origin", "unit");
    assert_eq!(body.labels.get("kind").map(String::as_str), Some("test"));
    assert_eq!(body.labels.get("origin").map(String::as_str), Some("unit"));
}

#[test]
fn status_codes_use_the_rpc_numbering() {
    assert_eq!(StatusCode::Ok.value(), 0);
    assert_eq!(StatusCode::Cancelled.value(), 1);
    assert_eq!(StatusCode::DeadlineExceeded.value(), 4);
    assert_eq!(StatusCode::ResourceExhausted.value(), 8);
    assert_eq!(StatusCode::FailedPrecondition.value(), 9);
    assert_eq!(StatusCode::Unavailable.value(), 14);
}

#[test]
fn status_display_includes_code_and_message() {
    let status = Status::new(StatusCode::Unavailable, "server going away");
    let rendered = status.to_string();
    assert!(rendered.contains("14"));
    assert!(rendered.contains("server going away"));

    let ok = Status::ok();
    assert!(ok.to_string().contains('0'));
}
