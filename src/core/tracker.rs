//! Event tracking pipeline.
//!
//! `track` hands events to a background dispatcher over a channel so they
//! are attempted in call order without blocking the caller. Each event
//! waits for the configuration gate, gets one live delivery attempt, and
//! falls back to the pending-event store when delivery is not possible.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::gate::{ConfigurationGate, GateState};
use crate::http::Transport;
use crate::store::{PendingEvent, PendingEventStore};

/// What happened to a tracked event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    /// Delivered live.
    Delivered,
    /// Persisted for a later flush.
    Queued,
    /// Discarded: invalid, emitted before configuration, or not persistable.
    Dropped,
}

struct QueuedEvent {
    event: PendingEvent,
    enqueued_at: Instant,
}

struct Delivery {
    gate: Arc<ConfigurationGate>,
    store: Arc<PendingEventStore>,
    transport: Arc<dyn Transport>,
    ready_timeout: Duration,
}

impl Delivery {
    async fn deliver(&self, event: PendingEvent, wait: Duration) -> TrackOutcome {
        if event.event_type.trim().is_empty() {
            tracing::warn!("Dropping event with empty type");
            return TrackOutcome::Dropped;
        }

        match self.gate.wait_for_ready(wait).await {
            GateState::Unconfigured => {
                tracing::debug!(
                    "Dropping {} event emitted before configuration",
                    event.event_type
                );
                TrackOutcome::Dropped
            }
            GateState::Ready => match self.gate.session() {
                Some(session) => match self.transport.send_event(&session, &event).await {
                    Ok(()) => {
                        tracing::debug!("Delivered {} event", event.event_type);
                        TrackOutcome::Delivered
                    }
                    Err(e) if e.is_recoverable() => {
                        tracing::debug!("Live delivery of {} failed: {}", event.event_type, e);
                        self.persist(&event)
                    }
                    Err(e) => {
                        tracing::warn!("Backend rejected {} event: {}", event.event_type, e);
                        self.persist(&event)
                    }
                },
                None => self.persist(&event),
            },
            GateState::Configuring | GateState::Failed => self.persist(&event),
        }
    }

    fn persist(&self, event: &PendingEvent) -> TrackOutcome {
        match self.store.save(event) {
            Ok(()) => TrackOutcome::Queued,
            Err(e) => {
                tracing::warn!("Failed to queue {} event, event lost: {}", event.event_type, e);
                TrackOutcome::Dropped
            }
        }
    }
}

/// Public entry point for event emission.
pub struct EventTracker {
    delivery: Arc<Delivery>,
    dispatch_tx: mpsc::UnboundedSender<QueuedEvent>,
}

impl EventTracker {
    /// Create the tracker and start its dispatcher on `runtime`.
    ///
    /// The dispatcher stops once the tracker is dropped and the events
    /// already handed to it are processed.
    pub fn new(
        gate: Arc<ConfigurationGate>,
        store: Arc<PendingEventStore>,
        transport: Arc<dyn Transport>,
        ready_timeout: Duration,
        runtime: &Handle,
    ) -> Self {
        let delivery = Arc::new(Delivery {
            gate,
            store,
            transport,
            ready_timeout,
        });

        let (dispatch_tx, mut dispatch_rx) = mpsc::unbounded_channel::<QueuedEvent>();
        let dispatcher = Arc::clone(&delivery);

        runtime.spawn(async move {
            while let Some(queued) = dispatch_rx.recv().await {
                // events waiting behind a slow gate share one deadline
                let wait = dispatcher
                    .ready_timeout
                    .saturating_sub(queued.enqueued_at.elapsed());
                dispatcher.deliver(queued.event, wait).await;
            }
            tracing::debug!("Event dispatcher stopped");
        });

        Self {
            delivery,
            dispatch_tx,
        }
    }

    /// Fire-and-forget tracking. Never blocks and never fails.
    pub fn track(
        &self,
        event_type: impl Into<String>,
        campaign_id: Option<&str>,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) {
        let mut event = PendingEvent::new(event_type);
        event.campaign_id = campaign_id.map(str::to_string);
        if let Some(metadata) = metadata {
            event.metadata = metadata;
        }
        self.enqueue(event);
    }

    /// Hand a prepared event to the dispatcher.
    pub fn enqueue(&self, event: PendingEvent) {
        let queued = QueuedEvent {
            event,
            enqueued_at: Instant::now(),
        };
        if let Err(e) = self.dispatch_tx.send(queued) {
            tracing::warn!("Event dispatcher unavailable, dropping {} event", e.0.event.event_type);
        }
    }

    /// Run the pipeline inline and report the outcome.
    pub async fn track_and_wait(&self, event: PendingEvent) -> TrackOutcome {
        self.delivery
            .deliver(event, self.delivery.ready_timeout)
            .await
    }
}

impl std::fmt::Debug for EventTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTracker")
            .field("ready_timeout", &self.delivery.ready_timeout)
            .finish_non_exhaustive()
    }
}
