//! Domain model for personal notes.
//!
//! # Responsibility
//! - Define the note record exchanged with the remote store.
//! - Define the editable draft used at the create/update boundary.
//!
//! # Invariants
//! - Every visible note carries the owner id of the active session.
//! - Title/description emptiness is enforced on drafts, not on records.

pub mod note;
