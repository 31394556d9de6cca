//! Resilient asynchronous MQTT 3.1.1 client core.
//!
//! Wires together the protocol engine ([`session`]), the reconnection state
//! machine ([`supervisor`]), and the retrying public API ([`ops`]) on top of
//! whatever [`socket::Socket`] and [`link::LinkInterface`] the caller
//! supplies. See [`mqtt_core`] for the pure wire codec this crate drives.

pub mod config;
pub mod error;
pub mod keepalive;
pub mod link;
pub mod ops;
pub mod platform;
pub mod session;
pub mod socket;
pub mod stream_io;
pub mod supervisor;

pub use config::{ClientConfig, Will};
pub use error::{ClientError, ClientErrorKind};
pub use link::{AlwaysUpLink, LinkInterface};
pub use mqtt_core::QosLevel;
pub use platform::PlatformProfile;
pub use session::Session;
pub use socket::{Connector, Socket, TcpConnector, TcpSocket, TlsConnectorAdapter, TlsSocket};
pub use supervisor::{Supervisor, SupervisorState};
