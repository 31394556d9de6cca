use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::sync::Mutex;
use tokio::time::Instant;

use mqtt_core::codec::{ConnAckPacket, ConnectPacket, PubAckPacket, PublishPacket, SubAckPacket, SubscribePacket, UnsubAckPacket, UnsubscribePacket, Will as CoreWill};
use mqtt_core::{PidGenerator, QosLevel};

use crate::config::{ClientConfig, MAX_PAYLOAD_BYTES};
use crate::error::{ClientError, ClientErrorKind};
use crate::platform::PlatformProfile;
use crate::socket::Socket;
use crate::stream_io::{read_exact, write_all};

const SUBACK_FAILURE: u8 = 0x80;
const PUBACK_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Mutable session state, reset on every reconnect. Guarded by its own
/// mutex so the read-dispatch task can update it without taking `io_lock`.
struct SessionState {
    last_rx: Instant,
    next_pid: PidGenerator,
    awaited_pid: u16,
    received_pid: u16,
    /// Named `ack_pending` rather than a per-verb flag: subscribe and
    /// unsubscribe share it, which is safe only because `op_lock` never
    /// lets both be in flight at once.
    ack_pending: bool,
    ack_pid: u16,
    ack_ok: bool,
}

impl SessionState {
    fn fresh() -> Self {
        Self {
            last_rx: Instant::now(),
            next_pid: PidGenerator::new(),
            awaited_pid: 0,
            received_pid: 0,
            ack_pending: false,
            ack_pid: 0,
            ack_ok: false,
        }
    }
}

/// A single live MQTT session on top of one connected stream.
///
/// Cheap to clone: the socket, lock, and state are each held behind an
/// `Arc`, so a `Session` can be shared between the read-dispatch task and
/// any number of concurrent `Ops` calls.
pub struct Session<S: Socket> {
    socket: Arc<Mutex<S>>,
    op_lock: Arc<Mutex<()>>,
    state: Arc<Mutex<SessionState>>,
    config: ClientConfig,
    profile: PlatformProfile,
    on_message: Arc<dyn Fn(&str, &Bytes, bool) + Send + Sync>,
}

impl<S: Socket> Clone for Session<S> {
    fn clone(&self) -> Self {
        Self {
            socket: self.socket.clone(),
            op_lock: self.op_lock.clone(),
            state: self.state.clone(),
            config: self.config.clone(),
            profile: self.profile.clone(),
            on_message: self.on_message.clone(),
        }
    }
}

impl<S: Socket> Session<S> {
    pub fn new(
        socket: S,
        config: ClientConfig,
        profile: PlatformProfile,
        on_message: impl Fn(&str, &Bytes, bool) + Send + Sync + 'static,
    ) -> Self {
        Self {
            socket: Arc::new(Mutex::new(socket)),
            op_lock: Arc::new(Mutex::new(())),
            state: Arc::new(Mutex::new(SessionState::fresh())),
            config,
            profile,
            on_message: Arc::new(on_message),
        }
    }

    fn response_deadline(&self) -> Instant {
        Instant::now() + Duration::from_millis(self.config.response_time_ms)
    }

    pub async fn last_rx(&self) -> Instant {
        self.state.lock().await.last_rx
    }

    async fn touch_last_rx(&self) {
        self.state.lock().await.last_rx = Instant::now();
    }

    /// Sends CONNECT and validates the CONNACK. Resets session state,
    /// recycling the PID counter only when `clean` is set — a resumed
    /// session must not reissue a PID the broker still has in flight.
    pub async fn connect(&self, clean: bool) -> Result<(), ClientError> {
        let packet = ConnectPacket {
            client_id: self.config.client_id.clone(),
            clean_session: clean,
            keep_alive_s: self.config.keepalive_s,
            will: self.config.last_will.as_ref().map(|will| CoreWill {
                topic: will.topic.clone(),
                payload: will.payload.clone(),
                qos: will.qos,
                retain: will.retain,
            }),
            username: self.config.user.clone(),
            password: self.config.password.clone(),
        };

        let deadline = self.response_deadline();
        {
            let mut socket = self.socket.lock().await;
            write_all(&mut *socket, &packet.encode()?, deadline, &self.profile).await?;
            let body = read_exact(&mut *socket, 4, deadline, &self.profile).await?;
            let mut body = body.slice(2..);
            let ack = ConnAckPacket::decode(&mut body)?;
            if !ack.is_accepted() {
                return Err(ClientError::new(
                    ClientErrorKind::ProtocolError,
                    format!("broker rejected CONNECT with return code {}", ack.return_code),
                ));
            }
        }

        let mut state = self.state.lock().await;
        state.last_rx = Instant::now();
        if clean {
            state.next_pid = PidGenerator::new();
        }
        state.awaited_pid = 0;
        state.received_pid = 0;
        state.ack_pending = false;
        Ok(())
    }

    pub async fn publish(
        &self,
        topic: &str,
        payload: Bytes,
        retain: bool,
        qos: QosLevel,
    ) -> Result<(), ClientError> {
        if payload.len() >= MAX_PAYLOAD_BYTES {
            return Err(ClientError::new(
                ClientErrorKind::InvalidArgument,
                format!("publish payload of {} bytes exceeds the {MAX_PAYLOAD_BYTES} byte limit", payload.len()),
            ));
        }

        if qos == QosLevel::AtMostOnce {
            let packet = PublishPacket::new(topic, payload, qos, retain);
            let deadline = self.response_deadline();
            let mut socket = self.socket.lock().await;
            return write_all(&mut *socket, &packet.encode()?, deadline, &self.profile).await;
        }

        let _op_guard = self.op_lock.lock().await;

        let pid = {
            let mut state = self.state.lock().await;
            let pid = state.next_pid.next_pid();
            state.awaited_pid = pid;
            state.received_pid = 0;
            pid
        };

        let mut packet = PublishPacket::new(topic, payload, qos, retain);
        packet.pid = Some(pid);

        for attempt in 0..=self.config.max_repubs {
            packet.dup = attempt > 0;

            {
                let deadline = self.response_deadline();
                let mut socket = self.socket.lock().await;
                write_all(&mut *socket, &packet.encode()?, deadline, &self.profile).await?;
            }

            if self.await_puback(pid).await {
                return Ok(());
            }

            if attempt == self.config.max_repubs {
                return Err(ClientError::new(
                    ClientErrorKind::TimeoutError,
                    format!("no PUBACK for pid {pid} after {} attempts", attempt + 1),
                ));
            }
        }

        unreachable!("loop above always returns by its final iteration")
    }

    async fn await_puback(&self, pid: u16) -> bool {
        let deadline = self.response_deadline();
        loop {
            {
                let state = self.state.lock().await;
                if state.received_pid == pid {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(PUBACK_POLL_INTERVAL).await;
        }
    }

    pub async fn subscribe(&self, topic: &str, qos: QosLevel) -> Result<(), ClientError> {
        let _op_guard = self.op_lock.lock().await;

        let pid = {
            let mut state = self.state.lock().await;
            let pid = state.next_pid.next_pid();
            state.ack_pending = true;
            state.ack_pid = pid;
            pid
        };

        let packet = SubscribePacket {
            pid,
            topic: topic.to_string(),
            qos,
        };

        {
            let deadline = self.response_deadline();
            let mut socket = self.socket.lock().await;
            write_all(&mut *socket, &packet.encode()?, deadline, &self.profile).await?;
        }

        if !self.await_ack(pid).await {
            return Err(ClientError::new(
                ClientErrorKind::TimeoutError,
                format!("no SUBACK for pid {pid}"),
            ));
        }

        let ok = self.state.lock().await.ack_ok;
        if !ok {
            return Err(ClientError::new(
                ClientErrorKind::ProtocolError,
                format!("broker refused subscription to {topic}"),
            ));
        }
        Ok(())
    }

    pub async fn unsubscribe(&self, topic: &str) -> Result<(), ClientError> {
        let _op_guard = self.op_lock.lock().await;

        let pid = {
            let mut state = self.state.lock().await;
            let pid = state.next_pid.next_pid();
            state.ack_pending = true;
            state.ack_pid = pid;
            pid
        };

        let packet = UnsubscribePacket {
            pid,
            topic: topic.to_string(),
        };

        {
            let deadline = self.response_deadline();
            let mut socket = self.socket.lock().await;
            write_all(&mut *socket, &packet.encode()?, deadline, &self.profile).await?;
        }

        if !self.await_ack(pid).await {
            return Err(ClientError::new(
                ClientErrorKind::TimeoutError,
                format!("no UNSUBACK for pid {pid}"),
            ));
        }
        Ok(())
    }

    async fn await_ack(&self, pid: u16) -> bool {
        let deadline = self.response_deadline();
        loop {
            {
                let state = self.state.lock().await;
                if !state.ack_pending && state.ack_pid == pid {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(PUBACK_POLL_INTERVAL).await;
        }
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        let deadline = self.response_deadline();
        let mut socket = self.socket.lock().await;
        write_all(&mut *socket, &mqtt_core::codec::PingReqPacket.encode(), deadline, &self.profile).await
    }

    /// Best-effort DISCONNECT; the caller is tearing down the link either way.
    pub async fn disconnect_graceful(&self) {
        let deadline = Instant::now() + Duration::from_millis(500);
        let mut socket = self.socket.lock().await;
        let _ = write_all(&mut *socket, &mqtt_core::codec::DisconnectPacket.encode(), deadline, &self.profile).await;
        socket.close().await;
    }

    /// Non-blocking check for one inbound packet. A no-op if nothing has
    /// arrived. Per §4.1's dispatch table.
    pub async fn dispatch_once(&self) -> Result<(), ClientError> {
        let deadline = self.response_deadline();

        let (type_nibble, flags, body) = {
            let mut socket = self.socket.lock().await;

            let first = read_first_byte(&mut *socket).await?;
            let first = match first {
                None => return Ok(()),
                Some(byte) => byte,
            };

            let mut len_bytes = BytesMut::new();
            let remaining_len = loop {
                let byte = read_exact(&mut *socket, 1, deadline, &self.profile).await?[0];
                len_bytes.extend_from_slice(&[byte]);
                if byte & 0x80 == 0 {
                    break finish_varint(&len_bytes)?;
                }
                if len_bytes.len() == 4 {
                    return Err(ClientError::new(
                        ClientErrorKind::ProtocolError,
                        "remaining length varint exceeded 4 bytes",
                    ));
                }
            };

            let body = if remaining_len > 0 {
                read_exact(&mut *socket, remaining_len, deadline, &self.profile).await?
            } else {
                Bytes::new()
            };

            (first & 0xF0, first & 0x0F, body)
        };

        self.touch_last_rx().await;
        self.handle_frame(type_nibble, flags, body).await
    }

    async fn handle_frame(&self, type_nibble: u8, flags: u8, mut body: Bytes) -> Result<(), ClientError> {
        match type_nibble {
            0xD0 => Ok(()), // PINGRESP: liveness already refreshed above
            0x40 => {
                let ack = PubAckPacket::decode(&mut body)?;
                self.state.lock().await.received_pid = ack.pid;
                Ok(())
            }
            0x90 => {
                let ack = SubAckPacket::decode(&mut body)?;
                let mut state = self.state.lock().await;
                if ack.pid == state.ack_pid {
                    state.ack_ok = ack.return_code != SUBACK_FAILURE;
                    state.ack_pending = false;
                }
                Ok(())
            }
            0xB0 => {
                let ack = UnsubAckPacket::decode(&mut body)?;
                let mut state = self.state.lock().await;
                if ack.pid == state.ack_pid {
                    state.ack_pending = false;
                }
                Ok(())
            }
            0x30 => {
                let header = mqtt_core::FixedHeader {
                    packet_type: mqtt_core::PacketType::Publish,
                    flags,
                    remaining_len: body.len(),
                };
                let publish = PublishPacket::decode(header, &mut body)?;

                if publish.qos == QosLevel::AtLeastOnce {
                    if let Some(pid) = publish.pid {
                        let deadline = Instant::now() + Duration::from_millis(self.config.response_time_ms);
                        let mut socket = self.socket.lock().await;
                        write_all(&mut *socket, &PubAckPacket::new(pid).encode(), deadline, &self.profile).await?;
                    }
                }

                (self.on_message)(&publish.topic, &publish.payload, publish.retain);
                Ok(())
            }
            _ => Ok(()), // no other packet type originates from a broker
        }
    }
}

async fn read_first_byte(socket: &mut impl Socket) -> Result<Option<u8>, ClientError> {
    match socket.read(1).await? {
        None => Ok(None),
        Some(bytes) if bytes.is_empty() => Err(ClientError::new(
            ClientErrorKind::IoError,
            "connection closed by peer",
        )),
        Some(bytes) => Ok(Some(bytes[0])),
    }
}

fn finish_varint(bytes: &BytesMut) -> Result<usize, ClientError> {
    let mut mult: usize = 1;
    let mut value: usize = 0;
    for &byte in bytes.iter() {
        value += (byte & 0x7f) as usize * mult;
        mult *= 128;
    }
    Ok(value)
}
