//! Notification collaborator contracts.
//!
//! # Responsibility
//! - Define the fire-and-forget `notify(title, message)` side effect.
//! - Hold the user-facing texts posted after successful state changes.
//!
//! # Invariants
//! - Notifications are posted only after a write or session change has
//!   succeeded; failed operations never notify.
//! - Platform permission checks belong to the implementor.

use log::info;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

/// Title/message pair posted by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationText {
    pub title: &'static str,
    pub message: &'static str,
}

pub const NOTE_CREATED: NotificationText = NotificationText {
    title: "New Note Created",
    message: "Your note has been added to your collection.",
};

pub const NOTE_UPDATED: NotificationText = NotificationText {
    title: "Note Updated",
    message: "Changes saved successfully.",
};

pub const NOTE_REMOVED: NotificationText = NotificationText {
    title: "Note Removed",
    message: "The note was deleted.",
};

pub const ACCESS_GRANTED: NotificationText = NotificationText {
    title: "Access Granted",
    message: "You're now logged into your account.",
};

pub const SESSION_ENDED: NotificationText = NotificationText {
    title: "Session Ended",
    message: "You have logged out securely.",
};

/// Local notification sink.
pub trait Notifier {
    fn notify(&self, title: &str, message: &str);

    /// Posts one of the predefined texts.
    fn post(&self, text: NotificationText) {
        self.notify(text.title, text.message);
    }
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn notify(&self, title: &str, message: &str) {
        (**self).notify(title, message)
    }
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, title: &str, message: &str) {
        (**self).notify(title, message)
    }
}

/// Notifier that only records metadata in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(
            "event=notification_post module=notify status=ok title_len={} message_len={}",
            title.chars().count(),
            message.chars().count()
        );
    }
}

/// Posted notification waiting for the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Notifier that queues notifications until the host drains them.
///
/// The host decides whether it may display them (platform permission).
#[derive(Debug, Default)]
pub struct NotificationOutbox {
    pending: Mutex<Vec<Notification>>,
}

impl NotificationOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all queued notifications, oldest first.
    pub fn take(&self) -> Vec<Notification> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *pending)
    }

    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for NotificationOutbox {
    fn notify(&self, title: &str, message: &str) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notification {
                title: title.to_string(),
                message: message.to_string(),
            });
    }
}
