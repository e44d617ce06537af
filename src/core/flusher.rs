use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::gate::ConfigurationGate;
use crate::http::Transport;
use crate::store::PendingEventStore;

/// Result of one flush pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub attempted: usize,
    pub delivered: usize,
    pub requeued: usize,
    /// The pass did not run: another pass was in flight or the SDK was not
    /// ready.
    pub skipped: bool,
}

impl FlushReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

/// Clears the in-flight flag even if the pass is cancelled.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drains the pending-event store by retrying every queued event once.
///
/// Passes are single-flight: a trigger that arrives while a pass runs is
/// coalesced into it. There is no timer; passes only run when the SDK
/// becomes ready, comes back to the foreground, or the host asks.
pub struct RetryFlusher {
    gate: Arc<ConfigurationGate>,
    store: Arc<PendingEventStore>,
    transport: Arc<dyn Transport>,
    in_flight: AtomicBool,
}

impl RetryFlusher {
    pub fn new(
        gate: Arc<ConfigurationGate>,
        store: Arc<PendingEventStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            gate,
            store,
            transport,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn flush(&self) -> FlushReport {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Flush already in progress, coalescing");
            return FlushReport::skipped();
        }
        let _in_flight = InFlight(&self.in_flight);

        self.drain().await
    }

    async fn drain(&self) -> FlushReport {
        let Some(session) = self.gate.session() else {
            tracing::debug!("Skipping flush, SDK is {:?}", self.gate.state());
            return FlushReport::skipped();
        };

        let pending = self.store.get_all();
        if pending.is_empty() {
            return FlushReport::default();
        }

        let mut failed = Vec::new();
        for event in &pending {
            if let Err(e) = self.transport.send_event(&session, event).await {
                tracing::debug!("Retry of {} event failed: {}", event.event_type, e);
                failed.push(event.clone());
            }
        }

        let report = FlushReport {
            attempted: pending.len(),
            delivered: pending.len() - failed.len(),
            requeued: failed.len(),
            skipped: false,
        };

        // On a failed write-back the delivered events stay queued and are
        // sent again next pass.
        if let Err(e) = self.store.complete_drain(pending.len(), failed) {
            tracing::warn!("Failed to update pending events after flush: {}", e);
        }

        tracing::info!(
            "Flushed pending events: {} delivered, {} requeued",
            report.delivered,
            report.requeued
        );

        report
    }
}

impl std::fmt::Debug for RetryFlusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryFlusher")
            .field("in_flight", &self.is_running())
            .finish_non_exhaustive()
    }
}
