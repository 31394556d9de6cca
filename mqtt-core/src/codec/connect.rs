use bytes::{BufMut, Bytes, BytesMut};

use crate::err::EncodeError;
use crate::qos::QosLevel;
use crate::varint::{encode_bytes, encode_remaining_len, encode_utf8_str};

const PROTOCOL_NAME: &str = "MQTT";
const PROTOCOL_LEVEL: u8 = 0x04;

const FLAG_USERNAME: u8 = 0b1000_0000;
const FLAG_PASSWORD: u8 = 0b0100_0000;
const FLAG_WILL_RETAIN: u8 = 0b0010_0000;
const FLAG_CLEAN_SESSION: u8 = 0b0000_0010;
const FLAG_WILL: u8 = 0b0000_0100;

/// A Last Will and Testament to register with the broker on CONNECT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Will {
    pub topic: String,
    pub payload: Bytes,
    pub qos: QosLevel,
    pub retain: bool,
}

/// CONNECT packet (outbound only — this client never parses one).
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectPacket {
    pub client_id: String,
    pub clean_session: bool,
    pub keep_alive_s: u16,
    pub will: Option<Will>,
    pub username: Option<String>,
    pub password: Option<Bytes>,
}

impl ConnectPacket {
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut flags = 0u8;
        if self.clean_session {
            flags |= FLAG_CLEAN_SESSION;
        }

        let mut len = 2 + PROTOCOL_NAME.len() + 1 + 1 + 2; // protocol str + level + flags + keepalive
        len += 2 + self.client_id.len();

        if let Some(will) = &self.will {
            flags |= FLAG_WILL;
            // MQTT 3.1.1 places Will QoS in connect-flags bits 4:3 — `(qos & 0x3) << 3`.
            flags |= (will.qos.as_u8() & 0x3) << 3;
            if will.retain {
                flags |= FLAG_WILL_RETAIN;
            }
            len += 2 + will.topic.len();
            len += 2 + will.payload.len();
        }

        if let Some(username) = &self.username {
            flags |= FLAG_USERNAME;
            len += 2 + username.len();
        }

        if let Some(password) = &self.password {
            flags |= FLAG_PASSWORD;
            len += 2 + password.len();
        }

        let mut out = BytesMut::with_capacity(len + 5);
        out.put_u8(0x10);
        encode_remaining_len(&mut out, len)?;

        encode_utf8_str(&mut out, PROTOCOL_NAME)?;
        out.put_u8(PROTOCOL_LEVEL);
        out.put_u8(flags);
        out.put_u16(self.keep_alive_s);

        encode_utf8_str(&mut out, &self.client_id)?;

        if let Some(will) = &self.will {
            encode_utf8_str(&mut out, &will.topic)?;
            encode_bytes(&mut out, &will.payload)?;
        }
        if let Some(username) = &self.username {
            encode_utf8_str(&mut out, username)?;
        }
        if let Some(password) = &self.password {
            encode_bytes(&mut out, password)?;
        }

        Ok(out.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_minimal_connect() {
        let packet = ConnectPacket {
            client_id: "c1".to_string(),
            clean_session: true,
            keep_alive_s: 60,
            will: None,
            username: None,
            password: None,
        };
        let bytes = packet.encode().unwrap();
        assert_eq!(bytes[0], 0x10);
        // variable header: "MQTT" (6) + level (1) + flags (1) + keepalive (2) = 10
        // payload: client id "c1" (2 + 2) = 4
        assert_eq!(bytes[1], 14);
        assert_eq!(&bytes[2..8], b"\x00\x04MQTT");
        assert_eq!(bytes[8], PROTOCOL_LEVEL);
        assert_eq!(bytes[9], FLAG_CLEAN_SESSION);
    }

    #[test]
    fn encodes_will_qos_per_mqtt_311_bit_layout() {
        let packet = ConnectPacket {
            client_id: "c1".to_string(),
            clean_session: false,
            keep_alive_s: 0,
            will: Some(Will {
                topic: "a".to_string(),
                payload: Bytes::from_static(b"bye"),
                qos: QosLevel::AtLeastOnce,
                retain: true,
            }),
            username: None,
            password: None,
        };
        let bytes = packet.encode().unwrap();
        let flags = bytes[9];
        assert_eq!(flags & FLAG_WILL, FLAG_WILL);
        assert_eq!(flags & FLAG_WILL_RETAIN, FLAG_WILL_RETAIN);
        assert_eq!((flags >> 3) & 0x3, QosLevel::AtLeastOnce.as_u8());
    }
}
