//! Pure MQTT 3.1.1 protocol types: wire codec, packet identifiers, and QoS.
//!
//! This crate has no I/O and no async runtime dependency — it only turns
//! bytes into packets and packets into bytes. Everything that talks to a
//! socket lives one layer up.

pub mod codec;
pub mod err;
pub mod id;
pub mod qos;
pub mod varint;

pub use codec::{FixedHeader, MqttPacket, PacketType};
pub use err::{DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind};
pub use id::PidGenerator;
pub use qos::QosLevel;
