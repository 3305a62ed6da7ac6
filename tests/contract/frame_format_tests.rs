//! Pins the serialized frame shape both directions of the stream rely on.
//! A change here is a wire-format break, not a refactor.

use agent_uplink::{Frame, MessageBody, Status, StatusCode};
use serde_json::json;

#[test]
fn payload_frame_wire_shape() {
    let frame = Frame::body_with_id("m-1", MessageBody::from_text("hi").with_label("k", "v"));
    let value = serde_json::to_value(&frame).expect("serialize");
    assert_eq!(
        value,
        json!({
            "message_id": "m-1",
            "kind": {
                "body": {
                    "labels": { "k": "v" },
                    "payload": [104, 105]
                }
            }
        })
    );
}

#[test]
fn ack_frame_wire_shape() {
    let frame = Frame::ack_with_status("m-9", Status::new(StatusCode::DeadlineExceeded, "too slow"));
    let value = serde_json::to_value(&frame).expect("serialize");
    assert_eq!(
        value,
        json!({
            "message_id": "m-9",
            "kind": {
                "ack": {
                    "code": "deadline_exceeded",
                    "message": "too slow"
                }
            }
        })
    );
}

#[test]
fn success_ack_uses_the_ok_code() {
    let value = serde_json::to_value(Frame::ack("m-2")).expect("serialize");
    assert_eq!(value["kind"]["ack"]["code"], "ok");
    assert_eq!(value["kind"]["ack"]["message"], "");
}

#[test]
fn frames_round_trip_through_serde() {
    let frames = vec![
        Frame::body_with_id("a", MessageBody::from_text("payload").with_label("x", "y")),
        Frame::ack("b"),
        Frame::ack_with_status("c", Status::new(StatusCode::Unavailable, "gone")),
    ];
    for frame in frames {
        let encoded = serde_json::to_string(&frame).expect("serialize");
        let decoded: Frame = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, frame);
    }
}
