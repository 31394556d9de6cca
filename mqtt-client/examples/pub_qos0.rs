use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use mqtt_client::{AlwaysUpLink, ClientConfig, PlatformProfile, QosLevel, Supervisor, TcpConnector, Will};
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    let mut config = ClientConfig::new("pub_id_1", "127.0.0.1", 1883);
    config.last_will = Some(Will {
        topic: "qos0".to_string(),
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
    tokio::spawn(supervisor.clone().keep_connected());

    let mut idx = 0u32;
    loop {
        sleep(Duration::from_millis(10)).await;
        let payload = Bytes::from(format!("TEST QOS 0, idx: {idx}"));
        supervisor
            .publish("qos0", payload, false, QosLevel::AtMostOnce)
            .await
            .unwrap();
        println!("idx: {idx}");
        idx += 1;
    }
}
