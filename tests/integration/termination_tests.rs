//! Termination and error-surface scenarios: pending sends unblock when the
//! stream dies, post-termination calls fail fast, graceful close drains the
//! queue, stray and non-OK acks behave as pinned.

use std::sync::Arc;
use std::time::Duration;

use agent_uplink::{ClientConfig, Frame, MessageBody, Status, StatusCode, UplinkError};

use super::test_helpers::{connected_client, wait_until};

#[tokio::test(flavor = "multi_thread")]
async fn server_close_unblocks_pending_send() {
    let config = ClientConfig {
        ack_timeout_ms: 5_000,
        ..ClientConfig::default()
    };
    let (client, transport, _log) = connected_client(config).await;
    transport.set_mute(true);

    let client = Arc::new(client);
    let sender = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            client
                .send_message(MessageBody::from_text("stranded"))
                .await
        })
    };

    // Wait for the payload to reach the server, then kill the stream.
    assert!(wait_until(|| transport.requests().len() == 1, Duration::from_secs(2)).await);
    transport.close_with(Status::new(StatusCode::Unavailable, "server going away"));

    // The pending send unblocks with the terminal status in bounded time.
    let result = tokio::time::timeout(Duration::from_secs(2), sender)
        .await
        .expect("send must unblock")
        .expect("join");
    match result {
        Err(UplinkError::Stream(status)) => assert_eq!(status.code, StatusCode::Unavailable),
        other => panic!("expected stream termination error, got {other:?}"),
    }

    let final_status = client.await_reactor().await;
    assert_eq!(final_status.code, StatusCode::Unavailable);

    // Subsequent operations fail immediately.
    assert!(matches!(
        client.send_message(MessageBody::from_text("x")).await,
        Err(UplinkError::Unavailable(_))
    ));
    assert!(matches!(
        client.add_request(Frame::body(MessageBody::from_text("y"))),
        Err(UplinkError::Unavailable(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn graceful_close_drains_queue_and_terminates_cleanly() {
    let (client, transport, _log) = connected_client(ClientConfig::default()).await;

    client
        .add_request(Frame::body_with_id(
            "farewell-1",
            MessageBody::from_text("goodbye"),
        ))
        .expect("queue");
    client.close();

    let status = client.await_reactor().await;
    assert!(status.is_ok());

    // The queued frame was written before the half-close.
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].message_id, "farewell-1");
}

#[tokio::test(flavor = "multi_thread")]
async fn stray_ack_reaches_sink_without_disturbing_the_stream() {
    let (client, transport, log) = connected_client(ClientConfig::default()).await;

    transport.push_payload(Frame::ack("never-sent"));
    assert!(wait_until(|| log.lock().unwrap().len() == 1, Duration::from_secs(2)).await);
    {
        let observed = log.lock().unwrap();
        assert_eq!(observed[0].message_id, "never-sent");
        assert!(observed[0].ack_status().expect("ack").is_ok());
    }

    // The stream stays healthy.
    client
        .send_message(MessageBody::from_text("still alive"))
        .await
        .expect("send");
}

#[tokio::test(flavor = "multi_thread")]
async fn non_ok_ack_surfaces_to_the_sender_without_retry() {
    let config = ClientConfig {
        ack_timeout_ms: 5_000,
        ..ClientConfig::default()
    };
    let (client, transport, log) = connected_client(config).await;
    transport.set_mute(true);

    let client = Arc::new(client);
    let sender = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            client
                .send_message(MessageBody::from_text("rejected"))
                .await
        })
    };

    assert!(wait_until(|| transport.requests().len() == 1, Duration::from_secs(2)).await);
    let message_id = transport.requests()[0].message_id.clone();
    transport.push_payload(Frame::ack_with_status(
        message_id.clone(),
        Status::new(StatusCode::ResourceExhausted, "quota"),
    ));

    let result = tokio::time::timeout(Duration::from_secs(2), sender)
        .await
        .expect("send must resolve")
        .expect("join");
    match result {
        Err(UplinkError::Ack(status)) => {
            assert_eq!(status.code, StatusCode::ResourceExhausted);
        }
        other => panic!("expected ack status error, got {other:?}"),
    }

    // The non-OK ack resolved the send; it did not trigger a resend, and the
    // sink observed it unchanged.
    assert_eq!(transport.requests().len(), 1);
    let observed = log.lock().unwrap().clone();
    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0].message_id, message_id);
    assert_eq!(
        observed[0].ack_status().expect("ack").code,
        StatusCode::ResourceExhausted
    );
}
