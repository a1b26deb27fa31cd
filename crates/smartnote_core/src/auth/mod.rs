//! Auth collaborator contracts.
//!
//! # Responsibility
//! - Define the identity interface consumed by services and the notes feed.
//! - Ship an in-process provider and a SQLite-backed provider whose
//!   accounts and session survive a restart.
//!
//! # Invariants
//! - `current_owner_id() == None` means no session; callers must not touch
//!   the store on behalf of an absent owner.

use crate::model::note::OwnerId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod memory;
mod sqlite;

pub use memory::MemoryAuthProvider;
pub use sqlite::SqliteAuthProvider;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub owner_id: OwnerId,
    pub email: String,
}

/// Identity-service failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    InvalidEmail(String),
    WeakPassword { min_len: usize },
    AccountExists(String),
    Unavailable(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "the email or password is incorrect"),
            Self::InvalidEmail(email) => write!(f, "the email address is badly formatted: {email}"),
            Self::WeakPassword { min_len } => {
                write!(f, "password should be at least {min_len} characters")
            }
            Self::AccountExists(email) => {
                write!(f, "the email address is already in use: {email}")
            }
            Self::Unavailable(message) => write!(f, "{message}"),
        }
    }
}

impl Error for AuthError {}

/// Canonical account key: trimmed and lowercased.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates registration input and returns the normalized email.
pub(crate) fn check_new_account(email: &str, password: &str) -> Result<String, AuthError> {
    let email = normalize_email(email);
    if !EMAIL_RE.is_match(&email) {
        return Err(AuthError::InvalidEmail(email));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword {
            min_len: MIN_PASSWORD_LEN,
        });
    }
    Ok(email)
}

/// Identity provider used by the core.
pub trait AuthProvider {
    /// Owner id of the signed-in principal, if any.
    fn current_owner_id(&self) -> Option<OwnerId>;
    /// Signed-in principal, if any.
    fn current_principal(&self) -> Option<Principal>;
    /// Creates an account and signs it in.
    fn register(&self, email: &str, password: &str) -> Result<Principal, AuthError>;
    /// Verifies credentials and starts a session.
    fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError>;
    /// Ends the current session. No-op without one.
    fn sign_out(&self);
}

impl<T: AuthProvider + ?Sized> AuthProvider for &T {
    fn current_owner_id(&self) -> Option<OwnerId> {
        (**self).current_owner_id()
    }

    fn current_principal(&self) -> Option<Principal> {
        (**self).current_principal()
    }

    fn register(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        (**self).register(email, password)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        (**self).sign_in(email, password)
    }

    fn sign_out(&self) {
        (**self).sign_out()
    }
}

impl<T: AuthProvider + ?Sized> AuthProvider for Arc<T> {
    fn current_owner_id(&self) -> Option<OwnerId> {
        (**self).current_owner_id()
    }

    fn current_principal(&self) -> Option<Principal> {
        (**self).current_principal()
    }

    fn register(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        (**self).register(email, password)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        (**self).sign_in(email, password)
    }

    fn sign_out(&self) {
        (**self).sign_out()
    }
}
