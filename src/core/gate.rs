//! One-time initialization handshake and the readiness wait every dependent
//! call goes through.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};

use super::config::Configuration;
use crate::error::{CampaignKitError, ErrorCode};
use crate::http::{Session, Transport};

/// SDK lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No configuration supplied yet.
    Unconfigured,
    /// Configuration stored, handshake in flight.
    Configuring,
    /// Handshake succeeded; a session is available.
    Ready,
    /// Handshake failed. Dependent calls degrade instead of failing.
    Failed,
}

impl GateState {
    /// Whether waiting longer can change the outcome of a dependent call.
    pub fn is_settled(&self) -> bool {
        matches!(self, GateState::Ready | GateState::Failed)
    }
}

struct GateInner {
    state: GateState,
    config: Option<Configuration>,
    session: Option<Session>,
    /// Bumped by `reset` so a handshake started before it is discarded.
    generation: u64,
}

/// Holds the SDK credentials and gates dependent calls on initialization.
pub struct ConfigurationGate {
    inner: RwLock<GateInner>,
    transport: Arc<dyn Transport>,
    poll_interval: Duration,
    init_timeout: Duration,
    runtime: Handle,
    state_tx: watch::Sender<GateState>,
}

impl ConfigurationGate {
    /// A handshake still running after `init_timeout` moves the gate to
    /// `Failed`.
    pub fn new(
        transport: Arc<dyn Transport>,
        poll_interval: Duration,
        init_timeout: Duration,
        runtime: Handle,
    ) -> Self {
        let (state_tx, _) = watch::channel(GateState::Unconfigured);
        Self {
            inner: RwLock::new(GateInner {
                state: GateState::Unconfigured,
                config: None,
                session: None,
                generation: 0,
            }),
            transport,
            poll_interval,
            init_timeout,
            runtime,
            state_tx,
        }
    }

    pub fn state(&self) -> GateState {
        self.inner.read().state
    }

    pub fn configuration(&self) -> Option<Configuration> {
        self.inner.read().config.clone()
    }

    /// The handshake session, only while `Ready`.
    pub fn session(&self) -> Option<Session> {
        let inner = self.inner.read();
        match inner.state {
            GateState::Ready => inner.session.clone(),
            _ => None,
        }
    }

    /// Identifies the current configuration lifetime; bumped by `reset`.
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Run `f` only if no `reset` happened since `generation` was read.
    ///
    /// `reset` waits for `f` to finish, so anything `f` publishes is either
    /// visible to the reset or never happens.
    pub fn if_current<R>(&self, generation: u64, f: impl FnOnce() -> R) -> Option<R> {
        let inner = self.inner.read();
        (inner.generation == generation).then(f)
    }

    /// Receives every state transition.
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state_tx.subscribe()
    }

    /// Store `config` and start the handshake in the background.
    ///
    /// Only the first valid configuration is accepted; later calls are
    /// logged and ignored. Returns whether this call was accepted.
    pub fn configure(self: &Arc<Self>, config: Configuration) -> bool {
        if let Err(e) = config.validate() {
            tracing::warn!("Ignoring invalid configuration: {}", e);
            return false;
        }

        let generation = {
            let mut inner = self.inner.write();
            if inner.state != GateState::Unconfigured {
                tracing::info!(
                    "Ignoring configure() while {:?}; first configuration wins",
                    inner.state
                );
                return false;
            }
            inner.state = GateState::Configuring;
            inner.config = Some(config);
            self.state_tx.send_replace(GateState::Configuring);
            inner.generation
        };

        self.spawn_initialization(generation);
        true
    }

    /// Re-run the handshake after a failure, with the stored configuration.
    pub fn retry_initialization(self: &Arc<Self>) -> bool {
        let generation = {
            let mut inner = self.inner.write();
            if inner.state != GateState::Failed {
                return false;
            }
            inner.state = GateState::Configuring;
            self.state_tx.send_replace(GateState::Configuring);
            inner.generation
        };

        tracing::info!("Retrying SDK initialization");
        self.spawn_initialization(generation);
        true
    }

    /// Suspend until the gate is `Ready` or `Failed`, or `timeout` elapses.
    ///
    /// Polls every `poll_interval` without blocking the worker thread.
    /// Returns the last observed state; callers treat anything but `Ready`
    /// as degraded mode.
    pub async fn wait_for_ready(&self, timeout: Duration) -> GateState {
        let deadline = Instant::now() + timeout;

        loop {
            let state = self.state();
            if state.is_settled() {
                return state;
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::debug!("Timed out waiting for SDK readiness in {:?}", state);
                return state;
            }

            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Forget configuration and session and return to `Unconfigured`.
    pub fn reset(&self) {
        {
            let mut inner = self.inner.write();
            inner.state = GateState::Unconfigured;
            inner.config = None;
            inner.session = None;
            inner.generation = inner.generation.wrapping_add(1);
            self.state_tx.send_replace(GateState::Unconfigured);
        }
        tracing::info!("SDK reset");
    }

    fn spawn_initialization(self: &Arc<Self>, generation: u64) {
        let gate = Arc::clone(self);
        self.runtime.spawn(async move {
            gate.initialize(generation).await;
        });
    }

    async fn initialize(&self, generation: u64) {
        let Some(config) = self.configuration() else {
            return;
        };

        let result = match tokio::time::timeout(
            self.init_timeout,
            self.transport.authenticate(&config),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CampaignKitError::new(
                ErrorCode::InitTimeout,
                format!("Handshake did not complete within {:?}", self.init_timeout),
            )),
        };

        // published under the lock so a concurrent reset cannot be overtaken
        let mut inner = self.inner.write();
        if inner.generation != generation || inner.state != GateState::Configuring {
            tracing::debug!("Discarding stale initialization result");
            return;
        }

        match result {
            Ok(session) => {
                inner.session = Some(session);
                inner.state = GateState::Ready;
                tracing::info!("SDK ready for user {}", config.user_id);
            }
            Err(e) => {
                inner.state = GateState::Failed;
                tracing::warn!("SDK initialization failed: {}", e);
            }
        }
        self.state_tx.send_replace(inner.state);
    }
}

impl std::fmt::Debug for ConfigurationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationGate")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CampaignKitError, ErrorCode, Result};
    use crate::store::PendingEvent;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct HandshakeTransport {
        succeed: bool,
        /// `None` never completes.
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for HandshakeTransport {
        async fn authenticate(&self, config: &Configuration) -> Result<Session> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.delay {
                Some(delay) => sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
            if self.succeed {
                Ok(Session::new(config, "token"))
            } else {
                Err(CampaignKitError::new(ErrorCode::HttpServerError, "down"))
            }
        }

        async fn send_event(&self, _: &Session, _: &PendingEvent) -> Result<()> {
            Ok(())
        }

        async fn fetch_campaign_feed(&self, _: &Session, _: &str) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
    }

    fn gate_with(
        succeed: bool,
        delay: Option<Duration>,
        init_timeout: Duration,
    ) -> (Arc<ConfigurationGate>, Arc<HandshakeTransport>) {
        let transport = Arc::new(HandshakeTransport {
            succeed,
            delay,
            calls: AtomicUsize::new(0),
        });
        let gate = Arc::new(ConfigurationGate::new(
            transport.clone(),
            Duration::from_millis(10),
            init_timeout,
            Handle::current(),
        ));
        (gate, transport)
    }

    fn gate(succeed: bool, delay: Duration) -> (Arc<ConfigurationGate>, Arc<HandshakeTransport>) {
        gate_with(succeed, Some(delay), Duration::from_secs(5))
    }

    fn config(user_id: &str) -> Configuration {
        Configuration::new("acc", "app", user_id, "https://example.com")
    }

    #[tokio::test]
    async fn test_configure_reaches_ready() {
        let (gate, _) = gate(true, Duration::ZERO);
        assert_eq!(gate.state(), GateState::Unconfigured);

        assert!(gate.configure(config("u1")));
        let state = gate.wait_for_ready(Duration::from_secs(2)).await;

        assert_eq!(state, GateState::Ready);
        assert_eq!(gate.session().unwrap().access_token, "token");
    }

    #[tokio::test]
    async fn test_first_configuration_wins() {
        let (gate, transport) = gate(true, Duration::from_millis(50));

        assert!(gate.configure(config("first")));
        assert!(!gate.configure(config("second")));

        gate.wait_for_ready(Duration::from_secs(2)).await;
        assert_eq!(gate.configuration().unwrap().user_id, "first");
        assert_eq!(gate.session().unwrap().user_id, "first");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_configuration_is_ignored() {
        let (gate, _) = gate(true, Duration::ZERO);
        assert!(!gate.configure(Configuration::new("", "app", "u", "https://example.com")));
        assert_eq!(gate.state(), GateState::Unconfigured);
    }

    #[tokio::test]
    async fn test_failed_handshake_and_retry() {
        let (gate, transport) = gate(false, Duration::ZERO);

        gate.configure(config("u1"));
        assert_eq!(gate.wait_for_ready(Duration::from_secs(2)).await, GateState::Failed);
        assert!(gate.session().is_none());

        assert!(gate.retry_initialization());
        assert_eq!(gate.wait_for_ready(Duration::from_secs(2)).await, GateState::Failed);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_wait_times_out_while_unconfigured() {
        let (gate, _) = gate(true, Duration::ZERO);

        let started = Instant::now();
        let state = gate.wait_for_ready(Duration::from_millis(60)).await;

        assert_eq!(state, GateState::Unconfigured);
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_handshake() {
        let (gate, _) = gate(true, Duration::from_millis(100));

        gate.configure(config("u1"));
        gate.reset();
        sleep(Duration::from_millis(200)).await;

        assert_eq!(gate.state(), GateState::Unconfigured);
        assert!(gate.configuration().is_none());

        // a new configuration is accepted after reset
        assert!(gate.configure(config("u2")));
        assert_eq!(gate.wait_for_ready(Duration::from_secs(2)).await, GateState::Ready);
        assert_eq!(gate.session().unwrap().user_id, "u2");
    }

    #[tokio::test]
    async fn test_hung_handshake_times_out_to_failed() {
        let (gate, transport) = gate_with(true, None, Duration::from_millis(100));

        gate.configure(config("u1"));
        assert_eq!(
            gate.wait_for_ready(Duration::from_millis(30)).await,
            GateState::Configuring
        );

        assert_eq!(gate.wait_for_ready(Duration::from_secs(2)).await, GateState::Failed);
        assert!(gate.session().is_none());

        // a failed gate can be retried
        assert!(gate.retry_initialization());
        assert_eq!(
            gate.wait_for_ready(Duration::from_millis(30)).await,
            GateState::Configuring
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_handshake_does_not_publish() {
        let (gate, _) = gate(true, Duration::from_millis(100));
        let rx = gate.subscribe();

        gate.configure(config("u1"));
        gate.reset();
        sleep(Duration::from_millis(200)).await;

        assert_eq!(*rx.borrow(), GateState::Unconfigured);
        assert_eq!(gate.state(), GateState::Unconfigured);
    }

    #[tokio::test]
    async fn test_if_current_rejects_after_reset() {
        let (gate, _) = gate(true, Duration::ZERO);
        let generation = gate.generation();

        assert_eq!(gate.if_current(generation, || 1), Some(1));

        gate.reset();
        assert_eq!(gate.if_current(generation, || 1), None);
        assert_eq!(gate.if_current(gate.generation(), || 2), Some(2));
    }

    #[tokio::test]
    async fn test_subscribers_see_ready() {
        let (gate, _) = gate(true, Duration::ZERO);
        let mut rx = gate.subscribe();

        gate.configure(config("u1"));
        loop {
            rx.changed().await.unwrap();
            if *rx.borrow_and_update() == GateState::Ready {
                break;
            }
        }
    }
}
