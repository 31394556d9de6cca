use std::env;
use std::sync::Arc;

use mqtt_client::{AlwaysUpLink, ClientConfig, PlatformProfile, QosLevel, Supervisor, TcpConnector};

#[tokio::main]
async fn main() {
    let topic = env::args().nth(1).unwrap_or_else(|| "a/b".to_string());

    let on_message = move |topic: &str, payload: &bytes::Bytes, retained: bool| {
        println!("topic={topic} retained={retained} payload={payload:?}");
    };

    let config = ClientConfig::new("sub_id_1", "127.0.0.1", 1883);

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
    supervisor.subscribe(&topic, QosLevel::AtLeastOnce).await.unwrap();

    supervisor.keep_connected().await;
}
