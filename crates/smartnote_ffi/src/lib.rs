//! Flutter-facing bindings for SmartNote core.

pub mod api;
