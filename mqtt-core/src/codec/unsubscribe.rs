use bytes::{BufMut, Bytes, BytesMut};

use crate::err::EncodeError;
use crate::varint::{encode_remaining_len, encode_utf8_str};

/// UNSUBSCRIBE: `0xA2`, pid, one topic filter. Outbound only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsubscribePacket {
    pub pid: u16,
    pub topic: String,
}

impl UnsubscribePacket {
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let len = 2 + 2 + self.topic.len();
        let mut out = BytesMut::with_capacity(len + 5);
        out.put_u8(0xA2);
        encode_remaining_len(&mut out, len)?;
        out.put_u16(self.pid);
        encode_utf8_str(&mut out, &self.topic)?;
        Ok(out.freeze())
    }
}
