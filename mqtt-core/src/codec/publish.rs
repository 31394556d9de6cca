use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::FixedHeader;
use crate::err::{DecodeError, DecodeErrorKind, EncodeError};
use crate::qos::QosLevel;
use crate::varint::{decode_utf8_str, encode_remaining_len, encode_utf8_str};

/// A PUBLISH packet, either built locally to send or parsed from the broker.
#[derive(Clone, Debug, PartialEq)]
pub struct PublishPacket {
    pub topic: String,
    pub payload: Bytes,
    pub qos: QosLevel,
    pub retain: bool,
    pub dup: bool,
    pub pid: Option<u16>,
}

impl PublishPacket {
    pub fn new(topic: impl Into<String>, payload: Bytes, qos: QosLevel, retain: bool) -> Self {
        Self {
            topic: topic.into(),
            payload,
            qos,
            retain,
            dup: false,
            pid: None,
        }
    }

    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut len = 2 + self.topic.len() + self.payload.len();
        if self.qos != QosLevel::AtMostOnce {
            len += 2;
        }

        let first_byte = 0x30
            | ((self.dup as u8) << 3)
            | (self.qos.as_u8() << 1)
            | (self.retain as u8);

        let mut out = BytesMut::with_capacity(len + 5);
        out.put_u8(first_byte);
        encode_remaining_len(&mut out, len)?;
        encode_utf8_str(&mut out, &self.topic)?;
        if self.qos != QosLevel::AtMostOnce {
            out.put_u16(self.pid.unwrap_or(0));
        }
        out.put_slice(&self.payload);

        Ok(out.freeze())
    }

    /// Decodes the variable header and payload of an inbound PUBLISH. `header`
    /// carries the dup/qos/retain flag bits already split out of the fixed header.
    pub fn decode(header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodeError> {
        let dup = header.flags & 0b1000 != 0;
        let retain = header.flags & 0b0001 != 0;
        let qos = QosLevel::try_from((header.flags & 0b0110) >> 1)?;

        let topic = decode_utf8_str(body)?;

        let pid = if qos != QosLevel::AtMostOnce {
            if body.len() < 2 {
                return Err(DecodeError::new(
                    DecodeErrorKind::MalformedLength,
                    "PUBLISH with QoS > 0 is missing its packet identifier".to_string(),
                ));
            }
            Some(body.get_u16())
        } else {
            None
        };

        let payload = body.split_to(body.len());

        Ok(Self {
            topic,
            payload,
            qos,
            retain,
            dup,
            pid,
        })
    }
}
