use crate::err::{DecodeError, DecodeErrorKind};

/// MQTT 3.1.1 QoS level. Only the levels this client supports — QoS 2 is out of scope.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub enum QosLevel {
    AtMostOnce = 0,
    AtLeastOnce = 1,
}

impl QosLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for QosLevel {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Err(DecodeError::new(
                DecodeErrorKind::UnsupportedQos,
                "QoS 2 (exactly once) is not supported".to_string(),
            )),
            _ => Err(DecodeError::new(
                DecodeErrorKind::UnsupportedQos,
                format!("invalid QoS value: {value}"),
            )),
        }
    }
}
