use crate::err::DecodeError;

/// PINGRESP: `{0xD0, 0x00}`. Inbound only — the body is empty, so there is
/// nothing left to parse once the fixed header has been consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PingRespPacket;

impl PingRespPacket {
    pub fn decode() -> Result<Self, DecodeError> {
        Ok(Self)
    }
}
