//! Durable local storage for undelivered events.
//!
//! The pending-event log is a single keyed blob: the whole list is read and
//! written as one JSON document through a [`KeyValueStore`]. The SDK ships
//! a file-backed store for production and an in-memory store for tests and
//! hosts that bring their own persistence.

mod file;
mod pending;

pub use file::FileStore;
pub use pending::{PendingEvent, PendingEventStore, PENDING_EVENTS_KEY};

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::Result;

/// Minimal blob storage the pending-event log is persisted through.
///
/// Implementations only need to make a single `set` atomic with respect to
/// readers; serialization of read-modify-write cycles is done by
/// [`PendingEventStore`].
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`, `None` if nothing was stored.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the blob stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store. Contents do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}
