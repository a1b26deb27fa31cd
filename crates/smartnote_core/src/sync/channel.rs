//! Remote sync channel.
//!
//! # Responsibility
//! - Subscribe to "notes of one owner, newest first" on a `NoteStore`.
//! - Queue delivered events until the consumer polls them.
//!
//! # Invariants
//! - Every event is a complete snapshot or a failure notice, never a diff.
//! - After `release`, `poll` returns nothing and the store listener is gone.
//! - Events are yielded in delivery order.

use crate::model::note::OwnerId;
use crate::store::{
    ListenerRegistration, LiveQuery, NoteStore, SnapshotListener, StoreResult, SyncEvent,
};
use log::info;
use std::sync::mpsc::{self, Receiver};

/// Scoped live subscription for one owner's notes.
///
/// Dropping the channel releases the subscription.
pub struct RemoteSyncChannel {
    owner_id: OwnerId,
    registration: Option<ListenerRegistration>,
    events: Receiver<SyncEvent>,
}

impl RemoteSyncChannel {
    /// Subscribes to `owner_id`'s notes ordered by `timestamp` descending.
    ///
    /// The store's initial snapshot is queued before this returns.
    pub fn open<S: NoteStore + ?Sized>(
        store: &S,
        owner_id: impl Into<OwnerId>,
    ) -> StoreResult<Self> {
        let owner_id = owner_id.into();
        let (sender, events) = mpsc::channel();
        let listener: SnapshotListener = Box::new(move |event| {
            // Receiver gone means the channel was dropped; nothing to do.
            let _ = sender.send(event);
        });

        let registration = store.subscribe(LiveQuery::for_owner(owner_id.clone()), listener)?;
        info!("event=sync_open module=sync status=ok");

        Ok(Self {
            owner_id,
            registration: Some(registration),
            events,
        })
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Returns whether the subscription is still held.
    pub fn is_active(&self) -> bool {
        self.registration.is_some()
    }

    /// Drains queued events without blocking.
    pub fn poll(&self) -> Vec<SyncEvent> {
        if !self.is_active() {
            return Vec::new();
        }
        self.events.try_iter().collect()
    }

    /// Releases the subscription and discards undelivered events.
    ///
    /// Calling this more than once is a no-op.
    pub fn release(&mut self) {
        let Some(registration) = self.registration.take() else {
            return;
        };
        registration.remove();
        let discarded = self.events.try_iter().count();
        info!("event=sync_release module=sync status=ok discarded_events={discarded}");
    }
}

impl Drop for RemoteSyncChannel {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::RemoteSyncChannel;
    use crate::model::note::Note;
    use crate::store::{NoteStore, SqliteNoteStore, SyncEvent};

    #[test]
    fn open_queues_initial_snapshot() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        store.create(&Note::new("owner", "t", "d", 1)).unwrap();

        let channel = RemoteSyncChannel::open(&store, "owner").unwrap();
        let events = channel.poll();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], SyncEvent::Snapshot(notes) if notes.len() == 1));
        assert!(channel.poll().is_empty());
    }

    #[test]
    fn release_stops_delivery_and_unregisters() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let mut channel = RemoteSyncChannel::open(&store, "owner").unwrap();
        assert_eq!(store.listener_count(), 1);

        channel.release();
        assert!(!channel.is_active());
        assert_eq!(store.listener_count(), 0);

        store.create(&Note::new("owner", "t", "d", 1)).unwrap();
        assert!(channel.poll().is_empty());

        channel.release();
    }

    #[test]
    fn drop_releases_subscription() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        {
            let _channel = RemoteSyncChannel::open(&store, "owner").unwrap();
            assert_eq!(store.listener_count(), 1);
        }
        assert_eq!(store.listener_count(), 0);
    }
}
