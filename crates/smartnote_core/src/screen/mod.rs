//! Screen-level controllers.
//!
//! # Responsibility
//! - Wire sync, list, search and projection for one screen.
//! - Keep UI callbacks reducible to explicit method calls.

pub mod notes_feed;
