mod common;

use std::time::Duration;

use common::{suback_bytes, unsuback_bytes, MockSocket, ACCEPTED_CONNACK};
use mqtt_client::{ClientConfig, ClientErrorKind, PlatformProfile, QosLevel, Session};

fn test_config() -> ClientConfig {
    let mut config = ClientConfig::new("c1", "broker", 1883);
    config.response_time_ms = 300;
    config
}

#[tokio::test]
async fn subscribe_completes_on_matching_suback() {
    let socket = MockSocket::new();
    socket.push_inbound(&ACCEPTED_CONNACK).await;

    let session = Session::new(socket.clone(), test_config(), PlatformProfile::new(), |_, _, _| {});
    session.connect(true).await.unwrap();

    let dispatch_session = session.clone();
    let dispatcher = tokio::spawn(async move {
        loop {
            dispatch_session.dispatch_once().await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    let ack_socket = socket.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        ack_socket.push_inbound(&suback_bytes(1, 0x01)).await;
    });

    session.subscribe("x", QosLevel::AtLeastOnce).await.unwrap();
    dispatcher.abort();
}

#[tokio::test]
async fn subscribe_fails_on_suback_failure_code() {
    let socket = MockSocket::new();
    socket.push_inbound(&ACCEPTED_CONNACK).await;

    let session = Session::new(socket.clone(), test_config(), PlatformProfile::new(), |_, _, _| {});
    session.connect(true).await.unwrap();

    let dispatch_session = session.clone();
    let dispatcher = tokio::spawn(async move {
        loop {
            dispatch_session.dispatch_once().await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    let ack_socket = socket.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        ack_socket.push_inbound(&suback_bytes(1, 0x80)).await;
    });

    let err = session.subscribe("x", QosLevel::AtLeastOnce).await.unwrap_err();
    assert_eq!(err.kind(), ClientErrorKind::ProtocolError);
    dispatcher.abort();
}

#[tokio::test]
async fn unsubscribe_completes_on_matching_unsuback() {
    let socket = MockSocket::new();
    socket.push_inbound(&ACCEPTED_CONNACK).await;

    let session = Session::new(socket.clone(), test_config(), PlatformProfile::new(), |_, _, _| {});
    session.connect(true).await.unwrap();

    let dispatch_session = session.clone();
    let dispatcher = tokio::spawn(async move {
        loop {
            dispatch_session.dispatch_once().await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    let ack_socket = socket.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        ack_socket.push_inbound(&unsuback_bytes(1)).await;
    });

    session.unsubscribe("x").await.unwrap();
    dispatcher.abort();
}
