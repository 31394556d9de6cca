use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientErrorKind};
use crate::keepalive::{self, KeepAliveOutcome};
use crate::link::{self, LinkInterface};
use crate::platform::PlatformProfile;
use crate::session::Session;
use crate::socket::{Connector, Socket};

/// How long `LinkInterface::is_connected()` must stay true before the link
/// is considered stable enough to attempt a CONNECT.
const LINK_STABILITY_WINDOW: Duration = Duration::from_secs(5);
const LINK_PROBE_INTERVAL: Duration = Duration::from_secs(1);
const DISPATCH_YIELD: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Initial,
    LinkingUp,
    Connecting,
    Running,
    Failed,
    Paused,
}

/// Top-level reconnection state machine. Drives `LinkInterface` and
/// `Session` lifecycle; hosts the read-dispatch loop, the keep-alive loop,
/// and pause/resume control.
///
/// The read-dispatch and keep-alive "tasks" described in the design are
/// interleaved with `tokio::select!` inside [`Supervisor::run_while_connected`]
/// rather than spawned as separate tokio tasks. The scheduling model this
/// client targets is single-threaded cooperative to begin with, so a single
/// future selecting between the two achieves the same interleaving without
/// requiring the socket type to be `Send` — a constraint some embedded
/// transports can't meet.
pub struct Supervisor<S: Socket, C: Connector<S>, L: LinkInterface> {
    config: ClientConfig,
    profile: PlatformProfile,
    connector: C,
    link: Mutex<L>,
    state: Mutex<SupervisorState>,
    session: Mutex<Option<Session<S>>>,
    pause_requested: Mutex<bool>,
    reconnect_requested: Mutex<bool>,
    shutdown_requested: Mutex<bool>,
    resume_notify: Notify,
    on_message: Arc<dyn Fn(&str, &Bytes, bool) + Send + Sync>,
    on_link_state: Arc<dyn Fn(bool) + Send + Sync>,
    on_connect: Arc<dyn Fn() + Send + Sync>,
}

impl<S, C, L> Supervisor<S, C, L>
where
    S: Socket,
    C: Connector<S>,
    L: LinkInterface,
{
    pub fn new(
        config: ClientConfig,
        profile: PlatformProfile,
        connector: C,
        link: L,
        on_message: impl Fn(&str, &Bytes, bool) + Send + Sync + 'static,
        on_link_state: impl Fn(bool) + Send + Sync + 'static,
        on_connect: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            profile,
            connector,
            link: Mutex::new(link),
            state: Mutex::new(SupervisorState::Initial),
            session: Mutex::new(None),
            pause_requested: Mutex::new(false),
            reconnect_requested: Mutex::new(false),
            shutdown_requested: Mutex::new(false),
            resume_notify: Notify::new(),
            on_message: Arc::new(on_message),
            on_link_state: Arc::new(on_link_state),
            on_connect: Arc::new(on_connect),
        }
    }

    pub async fn state(&self) -> SupervisorState {
        *self.state.lock().await
    }

    pub async fn is_connected(&self) -> bool {
        matches!(self.state().await, SupervisorState::Running)
    }

    async fn set_state(&self, state: SupervisorState) {
        *self.state.lock().await = state;
    }

    /// Called by an `Ops` wrapper when a `Session` call comes back
    /// transient: asks the background loop to tear down and reconnect
    /// rather than waiting for its own dispatch loop to notice.
    pub(crate) async fn request_reconnect(&self) {
        *self.reconnect_requested.lock().await = true;
    }

    async fn reconnect_was_requested(&self) -> bool {
        let mut flag = self.reconnect_requested.lock().await;
        let was_set = *flag;
        *flag = false;
        was_set
    }

    pub(crate) async fn current_session(&self) -> Option<Session<S>> {
        self.session.lock().await.clone()
    }

    /// Blocks until the link is up and stable, retrying `LinkInterface::up`
    /// on every failed probe. Association alone doesn't prove the broker's
    /// host is reachable, so the stability window also requires a DNS
    /// lookup of the configured server to succeed at least once.
    async fn bring_link_up(&self) {
        loop {
            if let Err(err) = self.link.lock().await.up().await {
                log::warn!("link bring-up failed: {err}");
                tokio::time::sleep(LINK_PROBE_INTERVAL).await;
                continue;
            }

            let mut stable_since: Option<Instant> = None;
            let mut wan_confirmed = false;
            loop {
                tokio::time::sleep(LINK_PROBE_INTERVAL).await;
                if self.link.lock().await.is_connected() {
                    if !wan_confirmed {
                        wan_confirmed = link::wan_ok(&self.config.server).await;
                    }
                    let since = *stable_since.get_or_insert_with(Instant::now);
                    if wan_confirmed && since.elapsed() >= LINK_STABILITY_WINDOW {
                        return;
                    }
                } else {
                    break;
                }
            }
        }
    }

    /// Opens a fresh socket and attempts CONNECT. Retries internally,
    /// tearing down and re-establishing the link between attempts, until a
    /// CONNACK is accepted.
    async fn connect_session(&self) -> Session<S> {
        loop {
            self.set_state(SupervisorState::Connecting).await;

            let socket = match self.connector.connect().await {
                Ok(socket) => socket,
                Err(err) => {
                    log::warn!("socket connect failed: {err}");
                    self.set_state(SupervisorState::LinkingUp).await;
                    self.bring_link_up().await;
                    continue;
                }
            };

            let on_message = self.on_message.clone();
            let session = Session::new(socket, self.config.clone(), self.profile.clone(), move |topic, payload, retained| {
                on_message(topic, payload, retained);
            });

            let clean = if matches!(self.state().await, SupervisorState::Initial) {
                self.config.clean_init
            } else {
                self.config.clean
            };

            match session.connect(clean).await {
                Ok(()) => return session,
                Err(err) => {
                    log::warn!("CONNECT rejected: {err}");
                    self.set_state(SupervisorState::LinkingUp).await;
                    self.bring_link_up().await;
                }
            }
        }
    }

    /// Runs the read-dispatch + keep-alive interleaving while `Running`.
    /// Returns the error that ended the session, or `None` if a pause was
    /// requested instead.
    async fn run_while_connected(&self, session: &Session<S>) -> Option<ClientError> {
        let mut keepalive_deadline = Instant::now() + keepalive::TICK_INTERVAL;

        loop {
            if *self.pause_requested.lock().await {
                return None;
            }
            if self.reconnect_was_requested().await {
                return Some(ClientError::new(
                    ClientErrorKind::IoError,
                    "reconnect requested by an operation wrapper",
                ));
            }

            tokio::select! {
                res = session.dispatch_once() => {
                    if let Err(err) = res {
                        return Some(err);
                    }
                }
                _ = tokio::time::sleep_until(keepalive_deadline) => {
                    keepalive_deadline = Instant::now() + keepalive::TICK_INTERVAL;
                    match keepalive::tick(session, &self.config).await {
                        Ok(KeepAliveOutcome::BrokerDead) => {
                            return Some(ClientError::new(
                                ClientErrorKind::TimeoutError,
                                "broker missed its keepalive grace period",
                            ));
                        }
                        Ok(_) => {}
                        Err(err) => return Some(err),
                    }
                }
            }

            tokio::time::sleep(DISPATCH_YIELD).await;
        }
    }

    /// Brings the link up, opens a session, and transitions to `Running`.
    /// Shared by the initial [`Supervisor::connect`] and every reconnect
    /// `keep_connected` performs after a failure or a resume.
    async fn establish_session(&self) {
        self.set_state(SupervisorState::LinkingUp).await;
        self.bring_link_up().await;
        let session = self.connect_session().await;
        *self.session.lock().await = Some(session);
        self.set_state(SupervisorState::Running).await;
        (self.on_link_state)(true);
        (self.on_connect)();
    }

    /// Drives `Initial -> LinkingUp -> Connecting -> Running` once, blocking
    /// until the first session is established. The caller is expected to
    /// then run (or spawn) [`Supervisor::keep_connected`] to stay connected.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.establish_session().await;
        Ok(())
    }

    /// The background loop referred to in the design as `keep_connected`:
    /// observes `Running -> Failed` transitions and re-establishes the
    /// session for as long as the client has not been shut down. Also
    /// carries the `Paused -> Running` resume path, since both reconnect
    /// through the same link bring-up/CONNECT sequence.
    pub async fn keep_connected(self: Arc<Self>) {
        loop {
            let session = match self.current_session().await {
                Some(session) => session,
                None => return,
            };

            let failure = self.run_while_connected(&session).await;

            match failure {
                None => {
                    // pause() requested
                    session.disconnect_graceful().await;
                    self.link.lock().await.down().await;
                    *self.session.lock().await = None;
                    self.set_state(SupervisorState::Paused).await;
                    *self.pause_requested.lock().await = false;
                    self.resume_notify.notified().await;
                    if *self.shutdown_requested.lock().await {
                        return;
                    }
                    // The link was brought down deliberately, not lost, so no
                    // on_link_state(false) precedes this reconnect.
                    self.establish_session().await;
                }
                Some(err) => {
                    log::warn!("session failed: {err}");
                    self.set_state(SupervisorState::Failed).await;
                    (self.on_link_state)(false);
                    *self.session.lock().await = None;
                    self.link.lock().await.down().await;
                    if *self.shutdown_requested.lock().await {
                        return;
                    }
                    self.establish_session().await;
                }
            }
        }
    }

    /// Graceful shutdown: best-effort DISCONNECT, tear down the link, and
    /// stop `keep_connected` rather than reconnecting.
    pub async fn disconnect(&self) {
        *self.shutdown_requested.lock().await = true;
        if let Some(session) = self.current_session().await {
            session.disconnect_graceful().await;
        }
        self.link.lock().await.down().await;
        *self.pause_requested.lock().await = true;
        self.resume_notify.notify_one();
        self.set_state(SupervisorState::Paused).await;
    }

    /// Requests the `Running` loop pause at its next yield.
    pub async fn pause(&self) {
        *self.pause_requested.lock().await = true;
    }

    pub async fn resume(&self) {
        if self.state().await == SupervisorState::Paused {
            self.set_state(SupervisorState::LinkingUp).await;
            self.resume_notify.notify_one();
        }
    }
}
