//! Note record and draft model.
//!
//! # Responsibility
//! - Define the canonical `Note` shape delivered by store snapshots.
//! - Validate and normalize user input before any store write.
//!
//! # Invariants
//! - An empty `Note::id` means "not yet persisted".
//! - `timestamp` is epoch milliseconds and is the only sort key.
//! - A validated draft never has a blank title or description.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque store-assigned note identifier.
pub type NoteId = String;

/// Identifier of the authenticated principal that owns notes.
pub type OwnerId = String;

/// Note record as stored remotely and delivered in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Store-assigned id. Empty until persisted.
    #[serde(default)]
    pub id: NoteId,
    pub title: String,
    pub description: String,
    /// Creation/modification instant in epoch milliseconds.
    pub timestamp: i64,
    pub owner_id: OwnerId,
}

impl Note {
    /// Creates an unpersisted note owned by `owner_id`.
    pub fn new(
        owner_id: impl Into<OwnerId>,
        title: impl Into<String>,
        description: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: NoteId::new(),
            title: title.into(),
            description: description.into(),
            timestamp,
            owner_id: owner_id.into(),
        }
    }

    /// Returns a copy carrying the given store id.
    pub fn with_id(mut self, id: impl Into<NoteId>) -> Self {
        self.id = id.into();
        self
    }

    /// Returns whether the store has assigned an id to this note.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Validation failure for note drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    EmptyDescription,
}

impl NoteValidationError {
    /// Message shown to the user when the form is rejected.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "Please enter a title",
            Self::EmptyDescription => "Please enter description",
        }
    }
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be blank"),
            Self::EmptyDescription => write!(f, "note description must not be blank"),
        }
    }
}

impl Error for NoteValidationError {}

/// Form input for creating or editing one note.
///
/// `id = None` creates a new note; `Some(id)` replaces the existing one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub id: Option<NoteId>,
    pub title: String,
    pub description: String,
}

impl NoteDraft {
    /// Creates a draft for a new note.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Creates an edit draft pre-filled from an existing note.
    pub fn from_note(note: &Note) -> Self {
        Self {
            id: Some(note.id.clone()).filter(|id| !id.is_empty()),
            title: note.title.clone(),
            description: note.description.clone(),
        }
    }

    /// Returns the target id when this draft edits an existing note.
    pub fn edit_target(&self) -> Option<&str> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Trims input and checks required fields.
    ///
    /// Title is checked before description, so a draft with both fields
    /// blank reports `EmptyTitle`.
    pub fn validate(&self) -> Result<NoteDraft, NoteValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(NoteValidationError::EmptyDescription);
        }

        Ok(NoteDraft {
            id: self.edit_target().map(str::to_string),
            title: title.to_string(),
            description: description.to_string(),
        })
    }

    /// Builds the record to write for `owner_id` at `timestamp`.
    ///
    /// Callers should pass a draft returned by [`NoteDraft::validate`].
    pub fn into_note(self, owner_id: impl Into<OwnerId>, timestamp: i64) -> Note {
        Note {
            id: self.id.unwrap_or_default(),
            title: self.title,
            description: self.description,
            timestamp,
            owner_id: owner_id.into(),
        }
    }
}
