use std::time::Duration;

use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::Session;
use crate::socket::Socket;

/// How many missed ping cycles before the broker is declared dead. The
/// client never trusts the broker's own keepalive timer alone.
const DEAD_PING_CYCLES: u64 = 4;

/// Result of one keepalive tick.
pub enum KeepAliveOutcome {
    Ok,
    PingSent,
    BrokerDead,
}

/// Observes time-since-last-RX against the configured ping cadence. Runs on
/// a 1 s tick inside the supervisor's `Running` state; a single call here is
/// one of those ticks.
pub async fn tick<S: Socket>(
    session: &Session<S>,
    config: &ClientConfig,
) -> Result<KeepAliveOutcome, ClientError> {
    let interval_ms = config.ping_interval_ms();
    let elapsed_ms = Instant::now().saturating_duration_since(session.last_rx().await).as_millis() as u64;
    let pings_due = elapsed_ms / interval_ms.max(1);

    if pings_due >= DEAD_PING_CYCLES {
        return Ok(KeepAliveOutcome::BrokerDead);
    }
    if pings_due >= 1 {
        session.ping().await?;
        return Ok(KeepAliveOutcome::PingSent);
    }
    Ok(KeepAliveOutcome::Ok)
}

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformProfile;
    use bytes::Bytes;

    struct NullSocket;
    impl Socket for NullSocket {
        async fn read(&mut self, _max_n: usize) -> std::io::Result<Option<Bytes>> {
            Ok(None)
        }
        async fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
            Ok(bytes.len())
        }
        async fn close(&mut self) {}
    }

    #[tokio::test]
    async fn reports_ok_when_traffic_is_recent() {
        let config = ClientConfig::new("c1", "broker", 1883);
        let session = Session::new(NullSocket, config.clone(), PlatformProfile::new(), |_, _, _| {});
        let outcome = tick(&session, &config).await.unwrap();
        assert!(matches!(outcome, KeepAliveOutcome::Ok));
    }
}
