//! Listener bookkeeping for live queries.

use crate::store::{LiveQuery, SnapshotListener, SyncEvent};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

struct ListenerEntry {
    query: LiveQuery,
    listener: SnapshotListener,
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    entries: BTreeMap<u64, ListenerEntry>,
}

/// Registry of active live-query listeners.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct ListenerHub {
    state: Arc<Mutex<HubState>>,
}

impl ListenerHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one listener and returns its scoped registration.
    pub fn register(&self, query: LiveQuery, listener: SnapshotListener) -> ListenerRegistration {
        let mut state = lock_state(&self.state);
        state.next_id += 1;
        let id = state.next_id;
        state.entries.insert(id, ListenerEntry { query, listener });
        ListenerRegistration {
            id,
            hub: Arc::downgrade(&self.state),
        }
    }

    pub fn len(&self) -> usize {
        lock_state(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers events to active listeners in registration order.
    ///
    /// `event_for` is asked once per listener; returning `None` skips it.
    /// Returns the number of listeners that received an event.
    pub fn broadcast(&self, mut event_for: impl FnMut(&LiveQuery) -> Option<SyncEvent>) -> usize {
        let state = lock_state(&self.state);
        let mut delivered = 0;
        for entry in state.entries.values() {
            if let Some(event) = event_for(&entry.query) {
                (entry.listener)(event);
                delivered += 1;
            }
        }
        delivered
    }
}

/// Handle keeping one listener registered.
///
/// Dropping the handle (or calling [`ListenerRegistration::remove`])
/// unregisters the listener.
#[derive(Debug)]
pub struct ListenerRegistration {
    id: u64,
    hub: Weak<Mutex<HubState>>,
}

impl ListenerRegistration {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        let Some(state) = self.hub.upgrade() else {
            return false;
        };
        let guard = lock_state(&state);
        guard.entries.contains_key(&self.id)
    }

    /// Unregisters the listener.
    pub fn remove(self) {}
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        if let Some(state) = self.hub.upgrade() {
            lock_state(&state).entries.remove(&self.id);
        }
    }
}

fn lock_state(state: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
