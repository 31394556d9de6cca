use bytes::{Buf, Bytes};

use crate::err::{DecodeError, DecodeErrorKind};

const SUBACK_FAILURE: u8 = 0x80;

/// SUBACK: `{0x90, 0x03, pid-hi, pid-lo, return-code}`. Inbound only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubAckPacket {
    pub pid: u16,
    pub return_code: u8,
}

impl SubAckPacket {
    pub fn decode(body: &mut Bytes) -> Result<Self, DecodeError> {
        if body.len() != 3 {
            return Err(DecodeError::new(
                DecodeErrorKind::BadSubAck,
                format!("SUBACK body must be 3 bytes, got {}", body.len()),
            ));
        }
        let pid = body.get_u16();
        let return_code = body.get_u8();
        Ok(Self { pid, return_code })
    }

    pub fn is_success(&self) -> bool {
        self.return_code != SUBACK_FAILURE
    }
}
