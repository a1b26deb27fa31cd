//! Notes feed controller.
//!
//! # Responsibility
//! - Own the sync channel, authoritative list, query and display list for
//!   the notes screen.
//! - Recompute the display list on every snapshot and every query change.
//!
//! # Invariants
//! - No store access happens without a session owner.
//! - A subscription failure keeps the last good list and sets a notice.
//! - The display list is always `filter(authoritative list, query)`, so
//!   snapshot/query arrival order does not change the final result.
//! - After `close`, the channel is released and both lists are empty.

use crate::auth::AuthProvider;
use crate::list::note_list::NoteListStore;
use crate::model::note::Note;
use crate::search::filter::SearchFilter;
use crate::store::{NoteStore, StoreError, SyncEvent};
use crate::sync::channel::RemoteSyncChannel;
use crate::view::projector::{project_rows, NoteRow};
use chrono::FixedOffset;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors opening the notes feed.
#[derive(Debug)]
pub enum FeedError {
    /// No signed-in owner; the store was not queried.
    NoSession,
    Subscribe(StoreError),
}

impl FeedError {
    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoSession => "Please log in to see your notes.".to_string(),
            Self::Subscribe(err) => format!("Unable to load notes: {err}"),
        }
    }
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSession => write!(f, "no active session"),
            Self::Subscribe(err) => write!(f, "live query subscription failed: {err}"),
        }
    }
}

impl Error for FeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Subscribe(err) => Some(err),
            Self::NoSession => None,
        }
    }
}

/// Render model for the whole notes screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedView {
    /// Size of the authoritative list, independent of the query.
    pub total_notes: usize,
    pub rows: Vec<NoteRow>,
    /// True when the user has no notes at all.
    pub is_empty: bool,
    pub notice: Option<String>,
}

/// Controller for the notes list screen.
///
/// Must be driven from one consuming context; store callbacks only enqueue.
#[derive(Default)]
pub struct NotesFeed {
    channel: Option<RemoteSyncChannel>,
    notes: NoteListStore,
    filter: SearchFilter,
    display: Vec<Note>,
    notice: Option<String>,
}

impl NotesFeed {
    /// Subscribes to the signed-in owner's notes and applies the initial
    /// snapshot.
    ///
    /// # Errors
    /// - `NoSession` when `auth` has no current owner.
    /// - `Subscribe` when the store rejects the live query.
    pub fn open<S, A>(store: &S, auth: &A) -> Result<Self, FeedError>
    where
        S: NoteStore + ?Sized,
        A: AuthProvider + ?Sized,
    {
        let Some(owner_id) = auth.current_owner_id() else {
            warn!("event=feed_open module=screen status=error error_code=no_session");
            return Err(FeedError::NoSession);
        };

        let channel = RemoteSyncChannel::open(store, owner_id).map_err(|err| {
            warn!("event=feed_open module=screen status=error error_code=subscribe_failed");
            FeedError::Subscribe(err)
        })?;

        let mut feed = Self {
            channel: Some(channel),
            ..Self::default()
        };
        feed.pump();
        info!(
            "event=feed_open module=screen status=ok notes={}",
            feed.notes.count()
        );
        Ok(feed)
    }

    /// Applies all queued sync events. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let events = match self.channel.as_ref() {
            Some(channel) => channel.poll(),
            None => return 0,
        };
        let applied = events.len();
        for event in events {
            self.apply_event(event);
        }
        applied
    }

    /// Replaces the query and recomputes the display list.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.set_query(query);
        self.refresh_display();
    }

    pub fn query(&self) -> &str {
        self.filter.query()
    }

    /// Notes matching the current query, in authoritative order.
    pub fn display(&self) -> &[Note] {
        &self.display
    }

    /// Authoritative list as of the last snapshot.
    pub fn notes(&self) -> &[Note] {
        self.notes.notes()
    }

    pub fn total_count(&self) -> usize {
        self.notes.count()
    }

    /// Non-fatal notice from the last failed sync, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.channel
            .as_ref()
            .is_some_and(RemoteSyncChannel::is_active)
    }

    /// Projects the display list at `now_ms`.
    pub fn render(&self, now_ms: i64, offset: FixedOffset) -> FeedView {
        FeedView {
            total_notes: self.notes.count(),
            rows: project_rows(&self.display, now_ms, offset),
            is_empty: self.notes.is_empty(),
            notice: self.notice.clone(),
        }
    }

    /// Releases the subscription and clears all screen state.
    pub fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.release();
        }
        self.notes.clear();
        self.filter = SearchFilter::new();
        self.display.clear();
        self.notice = None;
        info!("event=feed_close module=screen status=ok");
    }

    fn apply_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Snapshot(notes) => {
                self.notes.replace(notes);
                self.notice = None;
                self.refresh_display();
                debug!(
                    "event=feed_snapshot module=screen status=ok notes={} visible={}",
                    self.notes.count(),
                    self.display.len()
                );
            }
            SyncEvent::Failed(message) => {
                warn!("event=feed_snapshot module=screen status=error error={message}");
                self.notice = Some(format!("Unable to refresh notes: {message}"));
            }
        }
    }

    fn refresh_display(&mut self) {
        self.display = self.filter.apply(self.notes.notes());
    }
}

#[cfg(test)]
mod tests {
    use super::{FeedError, NotesFeed};
    use crate::auth::{AuthProvider, MemoryAuthProvider};
    use crate::model::note::Note;
    use crate::store::{NoteStore, SqliteNoteStore};
    use crate::view::projector::utc_offset_from_minutes;

    #[test]
    fn open_without_session_does_not_subscribe() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let auth = MemoryAuthProvider::new();

        let err = NotesFeed::open(&store, &auth).err().expect("no session");
        assert!(matches!(err, FeedError::NoSession));
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn query_change_and_snapshot_converge_in_any_order() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let auth = MemoryAuthProvider::new();
        let owner = auth.register("ada@example.com", "secret1").unwrap().owner_id;

        let mut query_first = NotesFeed::open(&store, &auth).unwrap();
        let mut snapshot_first = NotesFeed::open(&store, &auth).unwrap();

        query_first.set_query("trip");
        store.create(&Note::new(owner.as_str(), "Trip", "Packing list", 10)).unwrap();
        store.create(&Note::new(owner.as_str(), "Work", "Standup", 20)).unwrap();
        query_first.pump();

        snapshot_first.pump();
        snapshot_first.set_query("trip");

        assert_eq!(query_first.display(), snapshot_first.display());
        assert_eq!(query_first.display().len(), 1);
        assert_eq!(query_first.total_count(), 2);
    }

    #[test]
    fn close_releases_channel_and_clears_state() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let auth = MemoryAuthProvider::new();
        let owner = auth.register("ada@example.com", "secret1").unwrap().owner_id;
        store.create(&Note::new(owner, "t", "d", 1)).unwrap();

        let mut feed = NotesFeed::open(&store, &auth).unwrap();
        assert!(feed.is_open());
        assert_eq!(feed.total_count(), 1);

        feed.close();
        assert!(!feed.is_open());
        assert_eq!(store.listener_count(), 0);
        let view = feed.render(0, utc_offset_from_minutes(0));
        assert!(view.is_empty);
        assert!(view.rows.is_empty());
        assert_eq!(feed.pump(), 0);
    }
}
