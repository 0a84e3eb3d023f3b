//! Event Locks - Serializes the check-then-write steps of RSVP writes per event

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

#[derive(Default)]
pub struct EventLocks {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

/// Held while an event is being written; the entry of an event nobody waits
/// for is dropped from the map on release
pub struct EventGuard<'a> {
    event_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<i64, Arc<Mutex<()>>>,
}

impl Drop for EventGuard<'_> {
    fn drop(&mut self) {
        // release the mutex first so its Arc no longer counts
        self.guard.take();
        // clones are taken under the shard lock, so the count can not grow during the check
        self.locks
            .remove_if(&self.event_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl EventLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other writer holds the event, the guard releases it on drop
    pub async fn acquire(&self, event_id: i64) -> EventGuard<'_> {
        // clone the Arc out of the map so no shard lock is held across the await
        let lock = self.locks.entry(event_id).or_default().value().clone();
        debug!(event_id, "Waiting for event lock");
        EventGuard {
            event_id,
            guard: Some(lock.lock_owned().await),
            locks: &self.locks,
        }
    }

    /// Number of events currently locked or waited for
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
