use bytes::{BufMut, Bytes, BytesMut};

use crate::err::EncodeError;
use crate::qos::QosLevel;
use crate::varint::{encode_remaining_len, encode_utf8_str};

/// SUBSCRIBE: `0x82`, pid, one topic filter + requested QoS. Outbound only.
///
/// Only a single topic filter per SUBSCRIBE is modeled — matching the
/// one-operation-in-flight concurrency model, there is never a reason to
/// batch filters into one packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribePacket {
    pub pid: u16,
    pub topic: String,
    pub qos: QosLevel,
}

impl SubscribePacket {
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let len = 2 + 2 + self.topic.len() + 1;
        let mut out = BytesMut::with_capacity(len + 5);
        out.put_u8(0x82);
        encode_remaining_len(&mut out, len)?;
        out.put_u16(self.pid);
        encode_utf8_str(&mut out, &self.topic)?;
        out.put_u8(self.qos.as_u8());
        Ok(out.freeze())
    }
}
