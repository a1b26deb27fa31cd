//! Authoritative in-memory note list.

pub mod note_list;
