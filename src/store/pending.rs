use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::{KeyValueStore, MemoryStore};
use crate::error::{CampaignKitError, ErrorCode, Result};

/// Storage key of the pending-event log.
pub const PENDING_EVENTS_KEY: &str = "campaignkit.pending_events";

/// A tracking event that has not been delivered yet.
///
/// Serialized with camelCase field names; this is both the persisted form
/// and the request body sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEvent {
    /// Campaign the event refers to. Serialized as `null` when absent.
    pub campaign_id: Option<String>,

    /// Event type (e.g., "viewed", "clicked").
    pub event_type: String,

    /// Free-form event metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
}

impl PendingEvent {
    /// Create an event stamped with the current time.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            campaign_id: None,
            event_type: event_type.into(),
            metadata: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn campaign_id(mut self, id: impl Into<String>) -> Self {
        self.campaign_id = Some(id.into());
        self
    }

    pub fn metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add a single metadata field.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Durable, insertion-ordered log of undelivered events.
///
/// Every operation reads and/or rewrites the whole list under one mutex, so
/// concurrent `save` calls never interleave their read-modify-write cycles.
///
/// Reads fail open: a missing, unreadable or undecodable blob is treated as
/// an empty log. Writes replace the blob as a whole; if the backend loses a
/// write the whole queue may be lost, never half of it.
pub struct PendingEventStore {
    backend: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
}

impl PendingEventStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            lock: Mutex::new(()),
        }
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Append an event to the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated log cannot be written; the event is
    /// not persisted in that case.
    pub fn save(&self, event: &PendingEvent) -> Result<()> {
        let _guard = self.lock.lock();

        let mut events = self.read_locked();
        events.push(event.clone());
        self.write_locked(&events)?;

        tracing::debug!("Queued {} event, {} pending", event.event_type, events.len());

        Ok(())
    }

    /// All pending events in insertion order.
    pub fn get_all(&self) -> Vec<PendingEvent> {
        let _guard = self.lock.lock();
        self.read_locked()
    }

    pub fn len(&self) -> usize {
        self.get_all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every pending event.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock();
        self.backend.remove(PENDING_EVENTS_KEY)
    }

    /// Replace the whole log with `events`.
    pub fn replace(&self, events: &[PendingEvent]) -> Result<()> {
        let _guard = self.lock.lock();
        if events.is_empty() {
            self.backend.remove(PENDING_EVENTS_KEY)
        } else {
            self.write_locked(events)
        }
    }

    /// Finish a drain pass.
    ///
    /// The first `drained` entries are the snapshot a flush pass read; they
    /// are replaced by `failed` (the ones that still need delivery) while
    /// anything saved after the snapshot is kept behind them. An empty
    /// result clears the log. Returns the number of events left pending.
    pub fn complete_drain(&self, drained: usize, failed: Vec<PendingEvent>) -> Result<usize> {
        let _guard = self.lock.lock();

        let appended = self.read_locked().into_iter().skip(drained);
        let remaining: Vec<PendingEvent> = failed.into_iter().chain(appended).collect();

        if remaining.is_empty() {
            self.backend.remove(PENDING_EVENTS_KEY)?;
        } else {
            self.write_locked(&remaining)?;
        }

        Ok(remaining.len())
    }

    fn read_locked(&self) -> Vec<PendingEvent> {
        let bytes = match self.backend.get(PENDING_EVENTS_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read pending events, treating as empty: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Failed to decode pending events, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    fn write_locked(&self, events: &[PendingEvent]) -> Result<()> {
        let bytes = serde_json::to_vec(events).map_err(|e| {
            CampaignKitError::with_source(
                ErrorCode::StorageWriteError,
                "Failed to serialize pending events",
                e,
            )
        })?;
        self.backend.set(PENDING_EVENTS_KEY, &bytes)
    }
}

impl std::fmt::Debug for PendingEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingEventStore").finish_non_exhaustive()
    }
}
