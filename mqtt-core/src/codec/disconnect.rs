use bytes::Bytes;

/// DISCONNECT: `{0xE0, 0x00}`. Outbound only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DisconnectPacket;

impl DisconnectPacket {
    pub fn encode(&self) -> Bytes {
        Bytes::from_static(&[0xE0, 0x00])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_fixed_two_bytes() {
        assert_eq!(&DisconnectPacket.encode()[..], &[0xE0, 0x00]);
    }
}
