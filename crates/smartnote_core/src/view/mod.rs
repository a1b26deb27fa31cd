//! Render projections for the notes screen.
//!
//! # Responsibility
//! - Map display-list notes to render rows.
//! - Compute relative-time labels as a pure function of two instants.

pub mod projector;
