mod common;

use std::time::Duration;

use common::{puback_bytes, MockSocket, ACCEPTED_CONNACK};
use mqtt_client::keepalive::{self, KeepAliveOutcome};
use mqtt_client::{ClientConfig, PlatformProfile, Session};

fn test_config() -> ClientConfig {
    let mut config = ClientConfig::new("c1", "broker", 1883);
    config.keepalive_s = 4; // ping_interval_ms() derives to 1000ms (4/4)
    config
}

#[tokio::test(start_paused = true)]
async fn ticks_ok_immediately_after_connect() {
    let socket = MockSocket::new();
    socket.push_inbound(&ACCEPTED_CONNACK).await;
    let config = test_config();
    let session = Session::new(socket, config.clone(), PlatformProfile::new(), |_, _, _| {});
    session.connect(true).await.unwrap();

    let outcome = keepalive::tick(&session, &config).await.unwrap();
    assert!(matches!(outcome, KeepAliveOutcome::Ok));
}

#[tokio::test(start_paused = true)]
async fn sends_ping_once_the_interval_elapses() {
    let socket = MockSocket::new();
    socket.push_inbound(&ACCEPTED_CONNACK).await;
    let config = test_config();
    let session = Session::new(socket.clone(), config.clone(), PlatformProfile::new(), |_, _, _| {});
    session.connect(true).await.unwrap();
    let connect_len = socket.written().await.len();

    tokio::time::advance(Duration::from_millis(1100)).await;

    let outcome = keepalive::tick(&session, &config).await.unwrap();
    assert!(matches!(outcome, KeepAliveOutcome::PingSent));

    let written = socket.written().await;
    assert_eq!(&written[connect_len..], &[0xC0, 0x00]);
}

#[tokio::test(start_paused = true)]
async fn declares_broker_dead_after_four_missed_cycles() {
    let socket = MockSocket::new();
    socket.push_inbound(&ACCEPTED_CONNACK).await;
    let config = test_config();
    let session = Session::new(socket, config.clone(), PlatformProfile::new(), |_, _, _| {});
    session.connect(true).await.unwrap();

    tokio::time::advance(Duration::from_millis(4100)).await;

    let outcome = keepalive::tick(&session, &config).await.unwrap();
    assert!(matches!(outcome, KeepAliveOutcome::BrokerDead));
}

#[tokio::test(start_paused = true)]
async fn inbound_traffic_resets_the_keepalive_clock() {
    let socket = MockSocket::new();
    socket.push_inbound(&ACCEPTED_CONNACK).await;
    let config = test_config();
    let session = Session::new(socket.clone(), config.clone(), PlatformProfile::new(), |_, _, _| {});
    session.connect(true).await.unwrap();

    tokio::time::advance(Duration::from_millis(1100)).await;
    socket.push_inbound(&puback_bytes(7)).await;
    session.dispatch_once().await.unwrap();

    let outcome = keepalive::tick(&session, &config).await.unwrap();
    assert!(matches!(outcome, KeepAliveOutcome::Ok));
}
