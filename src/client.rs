use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;

use crate::campaign::{decode_feed, Campaign, CampaignRegistry};
use crate::core::{
    CampaignKitOptions, Configuration, ConfigurationGate, EventTracker, FlushReport, GateState,
    RetryFlusher, TrackOutcome,
};
use crate::error::{CampaignKitError, Result};
use crate::http::{HttpTransport, Transport};
use crate::store::{FileStore, KeyValueStore, PendingEvent, PendingEventStore};

pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

struct Inner {
    options: CampaignKitOptions,
    runtime: Handle,
    transport: Arc<dyn Transport>,
    gate: Arc<ConfigurationGate>,
    store: Arc<PendingEventStore>,
    registry: CampaignRegistry,
    tracker: EventTracker,
    flusher: Arc<RetryFlusher>,
}

/// The SDK instance.
///
/// Construct one at the host's composition root and clone it into every
/// call site; clones share all state. Nothing on this type returns an
/// error or panics once constructed: failures are logged and absorbed.
#[derive(Clone)]
pub struct CampaignKit {
    inner: Arc<Inner>,
}

impl CampaignKit {
    /// Create an SDK backed by HTTPS and a file store at
    /// `options.storage_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid, the storage directory
    /// cannot be created, or no Tokio runtime is running.
    pub fn new(options: CampaignKitOptions) -> Result<Self> {
        options.validate()?;
        let transport = Arc::new(HttpTransport::new(&options)?);
        let backend = Arc::new(FileStore::new(&options.storage_path)?);
        Self::with_parts(options, transport, backend)
    }

    /// Create an SDK with a custom transport and storage backend.
    pub fn with_parts(
        options: CampaignKitOptions,
        transport: Arc<dyn Transport>,
        backend: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        options.validate()?;
        let runtime = Handle::try_current().map_err(|_| CampaignKitError::no_runtime())?;

        let gate = Arc::new(ConfigurationGate::new(
            Arc::clone(&transport),
            options.ready_poll_interval,
            options.handshake_timeout(),
            runtime.clone(),
        ));
        let store = Arc::new(PendingEventStore::new(backend));
        let tracker = EventTracker::new(
            Arc::clone(&gate),
            Arc::clone(&store),
            Arc::clone(&transport),
            options.ready_timeout,
            &runtime,
        );
        let flusher = Arc::new(RetryFlusher::new(
            Arc::clone(&gate),
            Arc::clone(&store),
            Arc::clone(&transport),
        ));

        spawn_ready_listener(&runtime, &gate, Arc::downgrade(&flusher));

        Ok(Self {
            inner: Arc::new(Inner {
                options,
                runtime,
                transport,
                gate,
                store,
                registry: CampaignRegistry::new(),
                tracker,
                flusher,
            }),
        })
    }

    pub fn options(&self) -> &CampaignKitOptions {
        &self.inner.options
    }

    pub fn state(&self) -> GateState {
        self.inner.gate.state()
    }

    pub fn configuration(&self) -> Option<Configuration> {
        self.inner.gate.configuration()
    }

    /// Supply credentials and start initialization in the background.
    ///
    /// First write wins: calls after an accepted configuration are logged
    /// and ignored until [`reset`](Self::reset). Returns whether this call
    /// was accepted.
    pub fn configure(&self, config: Configuration) -> bool {
        self.inner.gate.configure(config)
    }

    /// Wait (bounded) for initialization and return the observed state.
    pub async fn wait_for_ready(&self, timeout: Duration) -> GateState {
        self.inner.gate.wait_for_ready(timeout).await
    }

    /// Record an engagement event. Returns immediately.
    pub fn track(
        &self,
        event_type: impl Into<String>,
        campaign_id: Option<&str>,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) {
        self.inner.tracker.track(event_type, campaign_id, metadata);
    }

    /// Record an event and wait for it to be delivered, queued or dropped.
    pub async fn track_and_wait(&self, event: PendingEvent) -> TrackOutcome {
        self.inner.tracker.track_and_wait(event).await
    }

    /// Fetch, decode and register the campaigns for `screen`.
    ///
    /// Returns an empty list when the SDK is not ready or the fetch fails;
    /// the registry keeps its previous snapshot in that case. A fetch that
    /// outlives a [`reset`](Self::reset) is discarded.
    pub async fn fetch_campaigns(&self, screen: &str) -> Vec<Campaign> {
        let inner = &self.inner;

        let state = inner.gate.wait_for_ready(inner.options.ready_timeout).await;
        let generation = inner.gate.generation();
        let Some(session) = inner.gate.session() else {
            tracing::debug!("Not fetching campaigns for {}, SDK is {:?}", screen, state);
            return Vec::new();
        };

        let raw = match inner.transport.fetch_campaign_feed(&session, screen).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to fetch campaigns for {}: {}", screen, e);
                return Vec::new();
            }
        };

        let mut campaigns = decode_feed(&raw);
        for campaign in &mut campaigns {
            if campaign.screen.is_none() {
                campaign.screen = Some(screen.to_string());
            }
        }

        let registered = inner.gate.if_current(generation, || {
            inner.registry.update(campaigns.clone());
        });
        if registered.is_none() {
            tracing::debug!("Discarding campaigns for {} fetched before reset", screen);
            return Vec::new();
        }

        campaigns
    }

    pub fn registry(&self) -> &CampaignRegistry {
        &self.inner.registry
    }

    /// Events waiting for delivery, oldest first.
    pub fn pending_events(&self) -> Vec<PendingEvent> {
        self.inner.store.get_all()
    }

    /// Retry queued events now.
    pub async fn flush_pending(&self) -> FlushReport {
        self.inner.flusher.flush().await
    }

    /// Host hook for app-foreground / network-available signals.
    ///
    /// Retries a failed initialization, or starts a flush when ready.
    pub fn on_foreground(&self) {
        match self.state() {
            GateState::Failed => {
                self.inner.gate.retry_initialization();
            }
            GateState::Ready => {
                let flusher = Arc::clone(&self.inner.flusher);
                self.inner.runtime.spawn(async move {
                    flusher.flush().await;
                });
            }
            GateState::Unconfigured | GateState::Configuring => {}
        }
    }

    /// Return to the unconfigured state and drop fetched campaigns.
    ///
    /// Queued events are kept and delivered after the next successful
    /// initialization.
    pub fn reset(&self) {
        self.inner.gate.reset();
        self.inner.registry.clear();
    }
}

impl std::fmt::Debug for CampaignKit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CampaignKit")
            .field("state", &self.state())
            .field("campaigns", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

/// Flush whenever the gate becomes ready.
fn spawn_ready_listener(runtime: &Handle, gate: &ConfigurationGate, flusher: Weak<RetryFlusher>) {
    let mut state_rx = gate.subscribe();
    runtime.spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = *state_rx.borrow_and_update();
            if state != GateState::Ready {
                continue;
            }
            match flusher.upgrade() {
                Some(flusher) => {
                    flusher.flush().await;
                }
                None => break,
            }
        }
    });
}
