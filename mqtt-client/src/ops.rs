//! Public operation wrappers: `publish`, `subscribe`, `unsubscribe`. Each
//! blocks until the client is connected, attempts the underlying `Session`
//! operation, and retries transparently on transient failure rather than
//! surfacing it to the caller.

use std::time::Duration;

use bytes::Bytes;
use mqtt_core::QosLevel;

use crate::error::{ClientError, ClientErrorKind};
use crate::link::LinkInterface;
use crate::socket::{Connector, Socket};
use crate::supervisor::Supervisor;

const CONNECTED_POLL_INTERVAL: Duration = Duration::from_secs(1);

impl<S, C, L> Supervisor<S, C, L>
where
    S: Socket,
    C: Connector<S>,
    L: LinkInterface,
{
    async fn wait_until_connected(&self) {
        while !self.is_connected().await {
            tokio::time::sleep(CONNECTED_POLL_INTERVAL).await;
        }
    }

    /// Runs `attempt` once connectivity is established, retrying it across
    /// reconnects for every transient failure. `ProtocolError` and
    /// `InvalidArgument` propagate immediately — they are not retryable.
    async fn retry_until_done<F, Fut>(&self, mut attempt: F) -> Result<(), ClientError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<(), ClientError>>,
    {
        loop {
            self.wait_until_connected().await;

            match attempt().await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() => {
                    self.request_reconnect().await;
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn publish(
        &self,
        topic: &str,
        payload: Bytes,
        retain: bool,
        qos: QosLevel,
    ) -> Result<(), ClientError> {
        self.retry_until_done(|| async {
            let session = self
                .current_session()
                .await
                .ok_or_else(|| ClientError::new(ClientErrorKind::LinkDown, "no active session"))?;
            session.publish(topic, payload.clone(), retain, qos).await
        })
        .await
    }

    pub async fn subscribe(&self, topic: &str, qos: QosLevel) -> Result<(), ClientError> {
        self.retry_until_done(|| async {
            let session = self
                .current_session()
                .await
                .ok_or_else(|| ClientError::new(ClientErrorKind::LinkDown, "no active session"))?;
            session.subscribe(topic, qos).await
        })
        .await
    }

    pub async fn unsubscribe(&self, topic: &str) -> Result<(), ClientError> {
        self.retry_until_done(|| async {
            let session = self
                .current_session()
                .await
                .ok_or_else(|| ClientError::new(ClientErrorKind::LinkDown, "no active session"))?;
            session.unsubscribe(topic).await
        })
        .await
    }
}
