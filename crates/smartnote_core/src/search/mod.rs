//! Local search over the authoritative note list.
//!
//! # Responsibility
//! - Derive the display list from the current notes and query.
//! - Keep matching deterministic: plain case-insensitive containment.

pub mod filter;
