//! Note list store.
//!
//! # Invariants
//! - The list equals exactly the last snapshot handed to `replace`.
//! - Records are never patched in place; every change is a wholesale swap.

use crate::model::note::Note;

/// Holds the current user's notes as last reported by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListStore {
    notes: Vec<Note>,
}

impl NoteListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps the list to exactly `snapshot`, keeping its order.
    pub fn replace(&mut self, snapshot: Vec<Note>) {
        self.notes = snapshot;
    }

    pub fn count(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}
