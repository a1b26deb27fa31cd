//! Store collaborator contracts.
//!
//! # Responsibility
//! - Define the live-query and write interface the core consumes.
//! - Provide the listener bookkeeping shared by store implementations.
//! - Ship a SQLite-backed implementation for hosts and tests.
//!
//! # Invariants
//! - Live queries deliver complete result sets, never diffs.
//! - A removed listener never receives another event.
//! - Writes are the only way records change; the core never patches
//!   delivered snapshots.

use crate::db::DbError;
use crate::model::note::{Note, NoteId, OwnerId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod listeners;
mod sqlite_store;

pub use listeners::{ListenerHub, ListenerRegistration};
pub use sqlite_store::SqliteNoteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error reported by store writes and subscriptions.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
    /// Store cannot serve the request right now (poisoned state, closed
    /// backend, remote outage).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid stored note data: {message}"),
            Self::Unavailable(message) => write!(f, "{message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Live query: all notes with `owner_id == owner`, `timestamp` descending.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LiveQuery {
    pub owner_id: OwnerId,
}

impl LiveQuery {
    pub fn for_owner(owner_id: impl Into<OwnerId>) -> Self {
        Self {
            owner_id: owner_id.into(),
        }
    }

    /// Returns whether `note` belongs to this query's result set.
    pub fn matches(&self, note: &Note) -> bool {
        note.owner_id == self.owner_id
    }
}

/// One delivery from a live query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Complete current result set, already ordered by the query.
    Snapshot(Vec<Note>),
    /// The query failed; carries a human-readable reason.
    Failed(String),
}

/// Callback receiving live-query events.
///
/// Stores may invoke it from any thread, so it must not call back into the
/// store that owns it.
pub type SnapshotListener = Box<dyn Fn(SyncEvent) + Send + 'static>;

/// Remote document store used by the core.
pub trait NoteStore {
    /// Starts a live query. The current result set is delivered right away,
    /// then again after every change that affects it.
    fn subscribe(
        &self,
        query: LiveQuery,
        listener: SnapshotListener,
    ) -> StoreResult<ListenerRegistration>;
    /// Reads one note by id.
    fn get(&self, id: &str) -> StoreResult<Option<Note>>;
    /// Inserts a note and returns the store-assigned id. `note.id` is ignored.
    fn create(&self, note: &Note) -> StoreResult<NoteId>;
    /// Replaces the note stored under `id` with `note`.
    fn update(&self, id: &str, note: &Note) -> StoreResult<()>;
    /// Removes the note stored under `id`. Removing a missing id succeeds.
    fn delete(&self, id: &str) -> StoreResult<()>;
}

impl<T: NoteStore + ?Sized> NoteStore for &T {
    fn subscribe(
        &self,
        query: LiveQuery,
        listener: SnapshotListener,
    ) -> StoreResult<ListenerRegistration> {
        (**self).subscribe(query, listener)
    }

    fn get(&self, id: &str) -> StoreResult<Option<Note>> {
        (**self).get(id)
    }

    fn create(&self, note: &Note) -> StoreResult<NoteId> {
        (**self).create(note)
    }

    fn update(&self, id: &str, note: &Note) -> StoreResult<()> {
        (**self).update(id, note)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        (**self).delete(id)
    }
}

impl<T: NoteStore + ?Sized> NoteStore for Arc<T> {
    fn subscribe(
        &self,
        query: LiveQuery,
        listener: SnapshotListener,
    ) -> StoreResult<ListenerRegistration> {
        (**self).subscribe(query, listener)
    }

    fn get(&self, id: &str) -> StoreResult<Option<Note>> {
        (**self).get(id)
    }

    fn create(&self, note: &Note) -> StoreResult<NoteId> {
        (**self).create(note)
    }

    fn update(&self, id: &str, note: &Note) -> StoreResult<()> {
        (**self).update(id, note)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        (**self).delete(id)
    }
}
