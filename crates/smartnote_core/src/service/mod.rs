//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, store writes and notifications into
//!   use-case level APIs.
//! - Keep UI/FFI layers decoupled from collaborator details.

pub mod note_service;
pub mod session_service;
