//! Core domain logic for SmartNote.
//! This crate owns note sync, search filtering and list projection so every
//! host shell renders the same rows from the same snapshots.

pub mod auth;
pub mod clock;
pub mod db;
pub mod list;
pub mod logging;
pub mod model;
pub mod notify;
pub mod screen;
pub mod search;
pub mod service;
pub mod store;
pub mod sync;
pub mod view;

pub use auth::{AuthError, AuthProvider, MemoryAuthProvider, Principal, SqliteAuthProvider};
pub use clock::{now_epoch_ms, Clock, SystemClock};
pub use list::note_list::NoteListStore;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteDraft, NoteId, NoteValidationError, OwnerId};
pub use notify::{LogNotifier, Notification, NotificationOutbox, NotificationText, Notifier};
pub use screen::notes_feed::{FeedError, FeedView, NotesFeed};
pub use search::filter::{filter_notes, SearchFilter};
pub use service::note_service::{NoteService, NoteServiceError, WriteAction, WriteOutcome};
pub use service::session_service::{
    launch_route, LaunchRoute, SessionError, SessionInfo, SessionService,
};
pub use store::{
    ListenerHub, ListenerRegistration, LiveQuery, NoteStore, SnapshotListener, SqliteNoteStore,
    StoreError, StoreResult, SyncEvent,
};
pub use sync::channel::RemoteSyncChannel;
pub use view::projector::{project_rows, relative_time_label, relative_time_label_in, NoteRow};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
