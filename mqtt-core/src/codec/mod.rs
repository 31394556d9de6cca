//! MQTT 3.1.1 fixed-header framing and the packet type enumeration.

mod connack;
mod connect;
mod disconnect;
mod pingreq;
mod pingresp;
mod puback;
mod publish;
mod suback;
mod subscribe;
mod unsuback;
mod unsubscribe;

pub use connack::ConnAckPacket;
pub use connect::{ConnectPacket, Will};
pub use disconnect::DisconnectPacket;
pub use pingreq::PingReqPacket;
pub use pingresp::PingRespPacket;
pub use puback::PubAckPacket;
pub use publish::PublishPacket;
pub use suback::SubAckPacket;
pub use subscribe::SubscribePacket;
pub use unsuback::UnsubAckPacket;
pub use unsubscribe::UnsubscribePacket;

use bytes::{Buf, Bytes};

use crate::err::{DecodeError, DecodeErrorKind};

const PACKET_TYPE_MASK: u8 = 0b1111_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketType {
    Connect,
    ConnAck,
    Publish,
    PubAck,
    Subscribe,
    SubAck,
    Unsubscribe,
    UnsubAck,
    PingReq,
    PingResp,
    Disconnect,
}

impl TryFrom<u8> for PacketType {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, DecodeError> {
        Ok(match byte & PACKET_TYPE_MASK {
            0x10 => Self::Connect,
            0x20 => Self::ConnAck,
            0x30 => Self::Publish,
            0x40 => Self::PubAck,
            0x80 => Self::Subscribe,
            0x90 => Self::SubAck,
            0xA0 => Self::Unsubscribe,
            0xB0 => Self::UnsubAck,
            0xC0 => Self::PingReq,
            0xD0 => Self::PingResp,
            0xE0 => Self::Disconnect,
            other => {
                return Err(DecodeError::new(
                    DecodeErrorKind::PacketType,
                    format!("packet type nibble 0x{:X} is not a packet this client handles", other),
                ))
            }
        })
    }
}

/// The decoded fixed header: packet type, flag bits, and the remaining length.
#[derive(Clone, Copy, Debug)]
pub struct FixedHeader {
    pub packet_type: PacketType,
    pub flags: u8,
    pub remaining_len: usize,
}

impl FixedHeader {
    /// Decodes the fixed header from `bytes`, consuming it up to and
    /// including the remaining-length varint.
    pub fn decode(bytes: &mut Bytes) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::new(
                DecodeErrorKind::MalformedLength,
                "received a zero-length packet".to_string(),
            ));
        }
        let first = bytes[0];
        let packet_type = PacketType::try_from(first)?;
        let flags = first & 0x0F;
        bytes.advance(1);

        let (header_len, remaining_len) = crate::varint::decode_remaining_len(bytes)?;
        bytes.advance(header_len);

        Ok(Self {
            packet_type,
            flags,
            remaining_len,
        })
    }
}

/// A decoded MQTT 3.1.1 control packet that this client may receive from a broker.
#[derive(Clone, Debug, PartialEq)]
pub enum MqttPacket {
    ConnAck(ConnAckPacket),
    Publish(PublishPacket),
    PubAck(PubAckPacket),
    SubAck(SubAckPacket),
    UnsubAck(UnsubAckPacket),
    PingResp(PingRespPacket),
}

impl MqttPacket {
    pub fn decode(header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodeError> {
        match header.packet_type {
            PacketType::ConnAck => Ok(Self::ConnAck(ConnAckPacket::decode(body)?)),
            PacketType::Publish => Ok(Self::Publish(PublishPacket::decode(header, body)?)),
            PacketType::PubAck => Ok(Self::PubAck(PubAckPacket::decode(body)?)),
            PacketType::SubAck => Ok(Self::SubAck(SubAckPacket::decode(body)?)),
            PacketType::UnsubAck => Ok(Self::UnsubAck(UnsubAckPacket::decode(body)?)),
            PacketType::PingResp => Ok(Self::PingResp(PingRespPacket::decode()?)),
            other => Err(DecodeError::new(
                DecodeErrorKind::PacketType,
                format!("{other:?} is not a packet a broker sends to a client"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_fixed_header() {
        let mut bytes = Bytes::from_static(&[0x90, 3, 0, 1, 0]);
        let header = FixedHeader::decode(&mut bytes).unwrap();
        assert_eq!(header.packet_type, PacketType::SubAck);
        assert_eq!(header.remaining_len, 3);
        assert_eq!(bytes.len(), 3);
    }

    #[test]
    fn rejects_unknown_type() {
        let mut bytes = Bytes::from_static(&[0xF0, 0]);
        assert!(FixedHeader::decode(&mut bytes).is_err());
    }
}
