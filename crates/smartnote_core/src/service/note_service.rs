//! Note write use-cases.
//!
//! # Responsibility
//! - Validate drafts before any store call.
//! - Create, replace and delete notes for the signed-in owner.
//! - Post the success notification for each completed write.
//!
//! # Invariants
//! - Validation failures never reach the store.
//! - Writes are never applied to local lists; the next snapshot carries them.
//! - Notifications are posted only on success.
//! - Updates and deletes only reach notes owned by the signed-in owner.
//! - Nothing is retried.

use crate::auth::AuthProvider;
use crate::clock::{Clock, SystemClock};
use crate::model::note::{NoteDraft, NoteId, NoteValidationError, OwnerId};
use crate::notify::{Notifier, NOTE_CREATED, NOTE_REMOVED, NOTE_UPDATED};
use crate::store::{NoteStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Kind of store write performed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Create,
    Update,
    Delete,
}

impl WriteAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Service error for note writes.
#[derive(Debug)]
pub enum NoteServiceError {
    Validation(NoteValidationError),
    /// No signed-in owner.
    NoSession,
    /// Delete requested for a note without a store id.
    MissingNoteId,
    Store {
        action: WriteAction,
        source: StoreError,
    },
}

impl NoteServiceError {
    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.user_message().to_string(),
            Self::NoSession => "Please log in again.".to_string(),
            Self::MissingNoteId => "Failed to delete: note has not been saved yet".to_string(),
            Self::Store {
                action: WriteAction::Delete,
                source,
            } => format!("Failed to delete: {source}"),
            Self::Store { source, .. } => format!("Error: {source}"),
        }
    }
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoSession => write!(f, "no active session"),
            Self::MissingNoteId => write!(f, "note id is empty"),
            Self::Store { action, source } => {
                write!(f, "note {} failed: {source}", action.as_str())
            }
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Result of a successful save or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub note_id: NoteId,
    pub action: WriteAction,
    /// Toast text for the host UI.
    pub message: &'static str,
}

/// Note write facade over store, auth and notifier collaborators.
pub struct NoteService<S, A, N, C = SystemClock> {
    store: S,
    auth: A,
    notifier: N,
    clock: C,
}

impl<S, A, N> NoteService<S, A, N, SystemClock>
where
    S: NoteStore,
    A: AuthProvider,
    N: Notifier,
{
    /// Creates a service stamping notes with the system clock.
    pub fn new(store: S, auth: A, notifier: N) -> Self {
        Self::with_clock(store, auth, notifier, SystemClock)
    }
}

impl<S, A, N, C> NoteService<S, A, N, C>
where
    S: NoteStore,
    A: AuthProvider,
    N: Notifier,
    C: Clock,
{
    pub fn with_clock(store: S, auth: A, notifier: N, clock: C) -> Self {
        Self {
            store,
            auth,
            notifier,
            clock,
        }
    }

    /// Creates (`draft.id == None`) or fully replaces the drafted note.
    ///
    /// # Contract
    /// - Title/description are trimmed and must be non-empty.
    /// - `timestamp` is set to the current clock reading.
    /// - On success posts "New Note Created" or "Note Updated".
    pub fn save_note(&self, draft: &NoteDraft) -> Result<WriteOutcome, NoteServiceError> {
        let draft = draft.validate()?;
        let owner_id = self.require_owner()?;
        let edit_target = draft.id.clone();
        let note = draft.into_note(owner_id, self.clock.now_ms());

        match edit_target {
            Some(note_id) => {
                self.ensure_not_foreign(WriteAction::Update, &note_id, &note.owner_id)?;
                self.store
                    .update(&note_id, &note)
                    .map_err(|source| store_failure(WriteAction::Update, source))?;
                info!("event=note_save module=service status=ok action=update");
                self.notifier.post(NOTE_UPDATED);
                Ok(WriteOutcome {
                    note_id,
                    action: WriteAction::Update,
                    message: "Note updated!",
                })
            }
            None => {
                let note_id = self
                    .store
                    .create(&note)
                    .map_err(|source| store_failure(WriteAction::Create, source))?;
                info!("event=note_save module=service status=ok action=create");
                self.notifier.post(NOTE_CREATED);
                Ok(WriteOutcome {
                    note_id,
                    action: WriteAction::Create,
                    message: "Note saved!",
                })
            }
        }
    }

    /// Deletes one note by store id.
    ///
    /// On success posts "Note Removed".
    pub fn delete_note(&self, note_id: &str) -> Result<WriteOutcome, NoteServiceError> {
        let note_id = note_id.trim();
        if note_id.is_empty() {
            return Err(NoteServiceError::MissingNoteId);
        }
        let owner_id = self.require_owner()?;
        self.ensure_not_foreign(WriteAction::Delete, note_id, &owner_id)?;

        self.store
            .delete(note_id)
            .map_err(|source| store_failure(WriteAction::Delete, source))?;
        info!("event=note_delete module=service status=ok");
        self.notifier.post(NOTE_REMOVED);
        Ok(WriteOutcome {
            note_id: note_id.to_string(),
            action: WriteAction::Delete,
            message: "Note deleted successfully",
        })
    }

    /// Rejects writes to a note stored under another owner. The note is
    /// reported as not found so its existence is not revealed.
    fn ensure_not_foreign(
        &self,
        action: WriteAction,
        note_id: &str,
        owner_id: &str,
    ) -> Result<(), NoteServiceError> {
        let stored = self
            .store
            .get(note_id)
            .map_err(|source| store_failure(action, source))?;
        match stored {
            Some(note) if note.owner_id != owner_id => {
                warn!(
                    "event=note_write module=service status=error action={} error_code=foreign_note",
                    action.as_str()
                );
                Err(NoteServiceError::Store {
                    action,
                    source: StoreError::NotFound(note_id.to_string()),
                })
            }
            _ => Ok(()),
        }
    }

    fn require_owner(&self) -> Result<OwnerId, NoteServiceError> {
        self.auth.current_owner_id().ok_or_else(|| {
            warn!("event=note_write module=service status=error error_code=no_session");
            NoteServiceError::NoSession
        })
    }
}

fn store_failure(action: WriteAction, source: StoreError) -> NoteServiceError {
    warn!(
        "event=note_write module=service status=error action={} error={}",
        action.as_str(),
        source
    );
    NoteServiceError::Store { action, source }
}
