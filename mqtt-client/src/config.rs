use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use mqtt_core::QosLevel;
use serde::Deserialize;

use crate::error::{ClientError, ClientErrorKind};

/// Maximum payload this client will accept into a `publish` call, matching
/// the broker-agnostic limit a 2-byte remaining-length field can still
/// represent unambiguously alongside a topic and PID.
pub const MAX_PAYLOAD_BYTES: usize = 2_097_152;

#[derive(Debug, Clone)]
pub struct Will {
    pub topic: String,
    pub payload: Bytes,
    pub qos: QosLevel,
    pub retain: bool,
}

/// Client configuration. Immutable once a [`crate::supervisor::Supervisor`]
/// is built from it — reconnects reuse the same values, including the
/// resolved server address.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub server: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<Bytes>,
    pub keepalive_s: u16,
    pub ping_interval_s: u16,
    pub response_time_ms: u64,
    pub clean_init: bool,
    pub clean: bool,
    pub max_repubs: u32,
    pub last_will: Option<Will>,
    pub use_tls: bool,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>, server: impl Into<String>, port: u16) -> Self {
        Self {
            client_id: client_id.into(),
            server: server.into(),
            port,
            user: None,
            password: None,
            keepalive_s: 60,
            ping_interval_s: 0,
            response_time_ms: 10_000,
            clean_init: true,
            clean: true,
            max_repubs: 4,
            last_will: None,
            use_tls: false,
        }
    }

    /// The cadence at which PINGREQ is considered due, per the keepalive
    /// design: `min(ping_interval_s, keepalive_s / 4)`, falling back to 20 s
    /// when `keepalive_s` is 0 (broker-side liveness disabled).
    pub fn ping_interval_ms(&self) -> u64 {
        if self.keepalive_s == 0 {
            return 20_000;
        }
        let derived = (self.keepalive_s / 4).max(1);
        let interval_s = if self.ping_interval_s != 0 && self.ping_interval_s < derived {
            self.ping_interval_s
        } else {
            derived
        };
        interval_s as u64 * 1000
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.client_id.is_empty() {
            return Err(ClientError::new(
                ClientErrorKind::InvalidArgument,
                "client_id must not be empty",
            ));
        }
        if let Some(will) = &self.last_will {
            if will.topic.is_empty() {
                return Err(ClientError::new(
                    ClientErrorKind::InvalidArgument,
                    "last_will topic must not be empty",
                ));
            }
            if will.payload.len() > MAX_PAYLOAD_BYTES {
                return Err(ClientError::new(
                    ClientErrorKind::InvalidArgument,
                    format!(
                        "last_will payload of {} bytes exceeds the {} byte limit",
                        will.payload.len(),
                        MAX_PAYLOAD_BYTES
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// On-disk representation, loaded via `TryFrom<&Path>` the way the broker
/// loads its own `toml` configuration. Useful for CLI-driven deployments;
/// library callers are free to build a [`ClientConfig`] directly instead.
#[derive(Deserialize)]
struct RawConfig {
    client_id: String,
    server: String,
    port: u16,
    user: Option<String>,
    password: Option<String>,
    keepalive_s: u16,
    #[serde(default)]
    ping_interval_s: u16,
    #[serde(default = "default_response_time_ms")]
    response_time_ms: u64,
    #[serde(default = "default_true")]
    clean_init: bool,
    #[serde(default = "default_true")]
    clean: bool,
    #[serde(default = "default_max_repubs")]
    max_repubs: u32,
    #[serde(default)]
    use_tls: bool,
}

fn default_response_time_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_max_repubs() -> u32 {
    4
}

impl TryFrom<&Path> for ClientConfig {
    type Error = ClientError;

    fn try_from(path: &Path) -> Result<Self, ClientError> {
        let mut file = File::open(path).map_err(|err| {
            log::error!("could not open config file {}: {err}", path.display());
            ClientError::new(ClientErrorKind::InvalidArgument, err.to_string())
        })?;

        let mut buf = String::new();
        file.read_to_string(&mut buf).map_err(|err| {
            log::error!("could not read config file {}: {err}", path.display());
            ClientError::new(ClientErrorKind::InvalidArgument, err.to_string())
        })?;

        let raw: RawConfig = toml::from_str(&buf).map_err(|err| {
            log::error!("invalid configuration in {}: {err}", path.display());
            ClientError::new(ClientErrorKind::InvalidArgument, err.to_string())
        })?;

        if raw.user.is_some() && raw.password.is_none() {
            log::warn!("user configured without a password");
        }

        Ok(ClientConfig {
            client_id: raw.client_id,
            server: raw.server,
            port: raw.port,
            user: raw.user,
            password: raw.password.map(Bytes::from),
            keepalive_s: raw.keepalive_s,
            ping_interval_s: raw.ping_interval_s,
            response_time_ms: raw.response_time_ms,
            clean_init: raw.clean_init,
            clean: raw.clean,
            max_repubs: raw.max_repubs,
            last_will: None,
            use_tls: raw.use_tls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_ping_interval_from_keepalive() {
        let config = ClientConfig::new("c1", "broker", 1883);
        assert_eq!(config.ping_interval_ms(), 15_000);
    }

    #[test]
    fn falls_back_to_twenty_seconds_when_keepalive_disabled() {
        let mut config = ClientConfig::new("c1", "broker", 1883);
        config.keepalive_s = 0;
        assert_eq!(config.ping_interval_ms(), 20_000);
    }

    #[test]
    fn ping_interval_overrides_when_smaller() {
        let mut config = ClientConfig::new("c1", "broker", 1883);
        config.keepalive_s = 60;
        config.ping_interval_s = 5;
        assert_eq!(config.ping_interval_ms(), 5_000);
    }

    #[test]
    fn rejects_empty_client_id() {
        let config = ClientConfig::new("", "broker", 1883);
        assert!(config.validate().is_err());
    }
}
