use bytes::Bytes;

/// PINGREQ: `{0xC0, 0x00}`. Outbound only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PingReqPacket;

impl PingReqPacket {
    pub fn encode(&self) -> Bytes {
        Bytes::from_static(&[0xC0, 0x00])
    }
}
