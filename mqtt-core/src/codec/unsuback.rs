use bytes::{Buf, Bytes};

use crate::err::{DecodeError, DecodeErrorKind};

/// UNSUBACK: `{0xB0, 0x02, pid-hi, pid-lo}`. Inbound only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnsubAckPacket {
    pub pid: u16,
}

impl UnsubAckPacket {
    pub fn decode(body: &mut Bytes) -> Result<Self, DecodeError> {
        if body.len() != 2 {
            return Err(DecodeError::new(
                DecodeErrorKind::MalformedLength,
                format!("UNSUBACK body must be 2 bytes, got {}", body.len()),
            ));
        }
        Ok(Self { pid: body.get_u16() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_pid() {
        let mut body = Bytes::from_static(&[0x00, 0x07]);
        assert_eq!(UnsubAckPacket::decode(&mut body).unwrap().pid, 7);
    }
}
