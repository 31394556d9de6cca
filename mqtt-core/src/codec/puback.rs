use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::err::{DecodeError, DecodeErrorKind};

/// PUBACK: `{0x40, 0x02, pid-hi, pid-lo}`. Sent to ack an inbound QoS1
/// PUBLISH, and received to ack an outbound one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PubAckPacket {
    pub pid: u16,
}

impl PubAckPacket {
    pub fn new(pid: u16) -> Self {
        Self { pid }
    }

    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(4);
        out.put_u8(0x40);
        out.put_u8(0x02);
        out.put_u16(self.pid);
        out.freeze()
    }

    pub fn decode(body: &mut Bytes) -> Result<Self, DecodeError> {
        if body.len() != 2 {
            return Err(DecodeError::new(
                DecodeErrorKind::MalformedLength,
                format!("PUBACK body must be 2 bytes, got {}", body.len()),
            ));
        }
        Ok(Self { pid: body.get_u16() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let encoded = PubAckPacket::new(99).encode();
        assert_eq!(&encoded[..], &[0x40, 0x02, 0x00, 99]);
        let mut body = encoded.slice(2..);
        assert_eq!(PubAckPacket::decode(&mut body).unwrap().pid, 99);
    }
}
