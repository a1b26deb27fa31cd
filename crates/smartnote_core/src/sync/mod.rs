//! Live synchronization from the remote store.
//!
//! # Responsibility
//! - Hold the owner-scoped live subscription for one consumer.
//! - Hand full-snapshot events to the single consuming context.

pub mod channel;
