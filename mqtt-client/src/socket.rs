use bytes::Bytes;
use futures::FutureExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

/// The non-blocking byte-stream capability the protocol layer is built on.
///
/// `read` never blocks: `None` means no bytes are currently available,
/// `Some(bytes)` with a non-empty payload is data, and `Some(empty)` is EOF.
/// Implementations poll their underlying I/O exactly once per call.
pub trait Socket {
    #[allow(async_fn_in_trait)]
    async fn read(&mut self, max_n: usize) -> std::io::Result<Option<Bytes>>;
    #[allow(async_fn_in_trait)]
    async fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize>;
    #[allow(async_fn_in_trait)]
    async fn close(&mut self);
}

/// Polls a single non-blocking read without suspending the caller: if the
/// read would otherwise await readiness, `now_or_never` resolves to `None`
/// and we report "no data" rather than waiting.
async fn poll_read_once(stream: &mut (impl AsyncReadExt + Unpin), max_n: usize) -> std::io::Result<Option<Bytes>> {
    let mut buf = vec![0u8; max_n];
    match stream.read(&mut buf).now_or_never() {
        None => Ok(None),
        Some(Ok(0)) => Ok(Some(Bytes::new())),
        Some(Ok(n)) => {
            buf.truncate(n);
            Ok(Some(Bytes::from(buf)))
        }
        Some(Err(err)) => Err(err),
    }
}

/// Produces a fresh, connected `Socket` on demand. The supervisor calls this
/// once per reconnect attempt — sockets are not reused across outages.
pub trait Connector<S: Socket> {
    #[allow(async_fn_in_trait)]
    async fn connect(&self) -> std::io::Result<S>;
}

pub struct TcpConnector {
    pub addr: String,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl Connector<TcpSocket> for TcpConnector {
    async fn connect(&self) -> std::io::Result<TcpSocket> {
        TcpSocket::connect(&self.addr).await
    }
}

pub struct TcpSocket {
    stream: TcpStream,
}

impl TcpSocket {
    pub async fn connect(addr: &str) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }
}

impl Socket for TcpSocket {
    async fn read(&mut self, max_n: usize) -> std::io::Result<Option<Bytes>> {
        poll_read_once(&mut self.stream, max_n).await
    }

    async fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.stream.write(bytes).await
    }

    async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}

/// Connects a fresh `TlsSocket` to the same `addr`/`server_name` on every
/// reconnect attempt, reusing one `rustls::ClientConfig` via `TlsConnector`.
pub struct TlsConnectorAdapter {
    pub addr: String,
    pub server_name: tokio_rustls::rustls::pki_types::ServerName<'static>,
    pub connector: TlsConnector,
}

impl TlsConnectorAdapter {
    pub fn new(addr: impl Into<String>, server_name: tokio_rustls::rustls::pki_types::ServerName<'static>, connector: TlsConnector) -> Self {
        Self {
            addr: addr.into(),
            server_name,
            connector,
        }
    }
}

impl Connector<TlsSocket> for TlsConnectorAdapter {
    async fn connect(&self) -> std::io::Result<TlsSocket> {
        TlsSocket::connect(&self.addr, self.server_name.clone(), self.connector.clone()).await
    }
}

pub struct TlsSocket {
    stream: TlsStream<TcpStream>,
}

impl TlsSocket {
    pub async fn connect(
        addr: &str,
        server_name: tokio_rustls::rustls::pki_types::ServerName<'static>,
        connector: TlsConnector,
    ) -> std::io::Result<Self> {
        let tcp = TcpStream::connect(addr).await?;
        tcp.set_nodelay(true)?;
        let stream = connector.connect(server_name, tcp).await?;
        Ok(Self { stream })
    }
}

impl Socket for TlsSocket {
    async fn read(&mut self, max_n: usize) -> std::io::Result<Option<Bytes>> {
        poll_read_once(&mut self.stream, max_n).await
    }

    async fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.stream.write(bytes).await
    }

    async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}
