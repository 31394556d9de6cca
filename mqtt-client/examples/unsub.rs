use std::sync::Arc;
use std::time::Duration;

use mqtt_client::{AlwaysUpLink, ClientConfig, PlatformProfile, QosLevel, Supervisor, TcpConnector};
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    let config = ClientConfig::new("test_id", "127.0.0.1", 1883);

    let on_message = |topic: &str, payload: &bytes::Bytes, retained: bool| {
        println!("topic={topic} retained={retained} payload={payload:?}");
    };

    let supervisor = Arc::new(Supervisor::new(
        config,
        PlatformProfile::new(),
        TcpConnector::new("127.0.0.1:1883"),
        AlwaysUpLink,
        on_message,
        |up| println!("link state: {up}"),
        || println!("connected"),
    ));

    supervisor.connect().await.unwrap();
    tokio::spawn(supervisor.clone().keep_connected());

    supervisor.subscribe("test", QosLevel::AtMostOnce).await.unwrap();
    println!("subscribed, unsubscribing in 5s");

    sleep(Duration::from_secs(5)).await;

    supervisor.unsubscribe("test").await.unwrap();
    println!("unsubscribed, shutting down");

    supervisor.disconnect().await;
}
