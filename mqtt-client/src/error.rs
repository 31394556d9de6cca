use std::fmt::{self, Display};

use mqtt_core::{DecodeError, EncodeError};

/// The error taxonomy surfaced to callers of [`crate::ops`].
///
/// `ProtocolError` and `InvalidArgument` are non-recoverable and propagate to
/// the caller as-is. `IoError`, `TimeoutError`, and `LinkDown` are transient
/// from the caller's point of view: the `Ops` wrappers swallow them, trigger
/// a reconnect, and retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    ProtocolError,
    IoError,
    TimeoutError,
    InvalidArgument,
    LinkDown,
}

#[derive(Debug, Clone)]
pub struct ClientError {
    kind: ClientErrorKind,
    message: String,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ClientErrorKind {
        self.kind
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ClientErrorKind::IoError | ClientErrorKind::TimeoutError | ClientErrorKind::LinkDown
        )
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ClientError {}

impl From<DecodeError> for ClientError {
    fn from(value: DecodeError) -> Self {
        Self::new(ClientErrorKind::ProtocolError, value.to_string())
    }
}

impl From<EncodeError> for ClientError {
    fn from(value: EncodeError) -> Self {
        Self::new(ClientErrorKind::InvalidArgument, value.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(value: std::io::Error) -> Self {
        Self::new(ClientErrorKind::IoError, value.to_string())
    }
}
