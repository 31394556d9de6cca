use bytes::{Buf, Bytes};

use crate::err::{DecodeError, DecodeErrorKind};

/// CONNACK: `{0x20, 0x02, session_present, return_code}`. Only the last two
/// bytes are passed to [`ConnAckPacket::decode`] — the fixed header is
/// already consumed by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnAckPacket {
    pub session_present: bool,
    pub return_code: u8,
}

impl ConnAckPacket {
    pub fn decode(body: &mut Bytes) -> Result<Self, DecodeError> {
        if body.len() != 2 {
            return Err(DecodeError::new(
                DecodeErrorKind::BadConnAck,
                format!("CONNACK body must be 2 bytes, got {}", body.len()),
            ));
        }
        let flags = body.get_u8();
        let return_code = body.get_u8();
        Ok(Self {
            session_present: flags & 0x01 != 0,
            return_code,
        })
    }

    pub fn is_accepted(&self) -> bool {
        self.return_code == 0
    }
}
