use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use mqtt_client::Socket;
use tokio::sync::Mutex;

/// An in-memory broker-side socket: bytes pushed with `push_inbound` are
/// what `Session` reads, bytes written by `Session` accumulate in `written`.
/// Cloning shares the same queues, so test code can keep a handle alongside
/// the one handed to `Session::new`.
#[derive(Clone)]
pub struct MockSocket {
    inbound: Arc<Mutex<VecDeque<u8>>>,
    outbound: Arc<Mutex<Vec<u8>>>,
    closed: Arc<Mutex<bool>>,
    eof: Arc<Mutex<bool>>,
}

impl MockSocket {
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            outbound: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(false)),
            eof: Arc::new(Mutex::new(false)),
        }
    }

    pub async fn push_inbound(&self, bytes: &[u8]) {
        self.inbound.lock().await.extend(bytes.iter().copied());
    }

    pub async fn written(&self) -> Vec<u8> {
        self.outbound.lock().await.clone()
    }

    pub async fn is_closed(&self) -> bool {
        *self.closed.lock().await
    }

    /// Makes subsequent reads report end-of-stream once the inbound queue
    /// drains, simulating the peer closing the connection.
    pub async fn simulate_eof(&self) {
        *self.eof.lock().await = true;
    }
}

impl Socket for MockSocket {
    async fn read(&mut self, max_n: usize) -> std::io::Result<Option<Bytes>> {
        let mut inbound = self.inbound.lock().await;
        if inbound.is_empty() {
            if *self.eof.lock().await {
                return Ok(Some(Bytes::new()));
            }
            return Ok(None);
        }
        let n = max_n.min(inbound.len());
        let chunk: Vec<u8> = inbound.drain(..n).collect();
        Ok(Some(Bytes::from(chunk)))
    }

    async fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.outbound.lock().await.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    async fn close(&mut self) {
        *self.closed.lock().await = true;
    }
}

/// Hands out pre-built sockets in order, one per `connect()` call. The
/// supervisor opens a fresh socket on every (re)connect attempt; this lets a
/// test script each attempt's CONNACK / failure independently.
pub struct MockConnector {
    sockets: Arc<Mutex<VecDeque<MockSocket>>>,
}

impl MockConnector {
    pub fn new(sockets: Vec<MockSocket>) -> Self {
        Self {
            sockets: Arc::new(Mutex::new(sockets.into())),
        }
    }
}

impl mqtt_client::Connector<MockSocket> for MockConnector {
    async fn connect(&self) -> std::io::Result<MockSocket> {
        self.sockets.lock().await.pop_front().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no more sockets queued for this test")
        })
    }
}

pub const ACCEPTED_CONNACK: [u8; 4] = [0x20, 0x02, 0x00, 0x00];

pub fn puback_bytes(pid: u16) -> [u8; 4] {
    let [hi, lo] = pid.to_be_bytes();
    [0x40, 0x02, hi, lo]
}

pub fn suback_bytes(pid: u16, return_code: u8) -> [u8; 5] {
    let [hi, lo] = pid.to_be_bytes();
    [0x90, 0x03, hi, lo, return_code]
}

pub fn unsuback_bytes(pid: u16) -> [u8; 4] {
    let [hi, lo] = pid.to_be_bytes();
    [0xB0, 0x02, hi, lo]
}
