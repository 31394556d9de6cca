use std::sync::Arc;

use bytes::Bytes;
use mqtt_client::{AlwaysUpLink, ClientConfig, PlatformProfile, QosLevel, Supervisor, TcpConnector, Will};

#[tokio::main]
async fn main() {
    let mut config = ClientConfig::new("pub_id_1", "127.0.0.1", 1883);
    config.last_will = Some(Will {
        topic: "test".to_string(),
        payload: Bytes::from_static(b"RETAIN"),
        qos: QosLevel::AtMostOnce,
        retain: true,
    });

    let supervisor = Arc::new(Supervisor::new(
        config,
        PlatformProfile::new(),
        TcpConnector::new("127.0.0.1:1883"),
        AlwaysUpLink,
        |_topic, _payload, _retained| {},
        |up| println!("link state: {up}"),
        || println!("connected"),
    ));

    supervisor.connect().await.unwrap();

    // Drop the connection without a graceful DISCONNECT so the broker
    // publishes the will. Check another client subscribed to "test".
    panic!("crashing on purpose to trigger the last will");
}
