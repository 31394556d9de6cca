use std::sync::Arc;
use std::time::Duration;

use mqtt_client::{AlwaysUpLink, ClientConfig, PlatformProfile, Supervisor, TlsConnectorAdapter};
use tokio_rustls::rustls::pki_types::pem::PemObject;
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName};
use tokio_rustls::rustls::{self, ClientConfig as RustlsClientConfig};
use tokio_rustls::TlsConnector;

const PING_COUNT: u32 = 100;

#[tokio::main]
async fn main() {
    let domain = "test.mqtt.com";

    let mut root_cert_store = rustls::RootCertStore::empty();
    for cert in CertificateDer::pem_file_iter("../mqtt-broker/tls/cert.pem").unwrap() {
        root_cert_store.add(cert.unwrap()).unwrap();
    }

    let rustls_config = RustlsClientConfig::builder()
        .with_root_certificates(root_cert_store)
        .with_no_client_auth();

    let tls_connector = TlsConnector::from(Arc::new(rustls_config));
    let server_name = ServerName::try_from(domain).unwrap().to_owned();

    let mut config = ClientConfig::new("test_id", domain, 8883);
    config.use_tls = true;

    let supervisor = Arc::new(Supervisor::new(
        config,
        PlatformProfile::new(),
        TlsConnectorAdapter::new("127.0.0.1:8883", server_name, tls_connector),
        AlwaysUpLink,
        |_topic, _payload, _retained| {},
        |up| println!("link state: {up}"),
        || println!("connected"),
    ));

    supervisor.connect().await.unwrap();
    // Keepalive pings are sent automatically by `keep_connected`'s tick loop;
    // this demo just observes the connection stays up over TLS.
    tokio::spawn(supervisor.clone().keep_connected());

    let start = tokio::time::Instant::now();
    for i in 0..PING_COUNT {
        tokio::time::sleep(Duration::from_millis(10)).await;
        println!("tick {i}, connected={}", supervisor.is_connected().await);
    }
    println!("observed {PING_COUNT} ticks over {:?}", start.elapsed());
}
