//! Session use-cases: launch routing, login, registration, logout.
//!
//! # Invariants
//! - Blank credentials are rejected before the auth collaborator is called.
//! - Logout releases the notes feed before the session ends, so no snapshot
//!   is delivered for a signed-out owner.
//! - "Access Granted" / "Session Ended" are posted only on success.

use crate::auth::{AuthError, AuthProvider, Principal};
use crate::model::note::OwnerId;
use crate::notify::{Notifier, ACCESS_GRANTED, SESSION_ENDED};
use crate::screen::notes_feed::NotesFeed;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const FALLBACK_DISPLAY_NAME: &str = "User";

/// First screen to show on launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchRoute {
    Notes,
    Login,
}

/// Picks the start screen from the current session.
pub fn launch_route<A: AuthProvider + ?Sized>(auth: &A) -> LaunchRoute {
    if auth.current_owner_id().is_some() {
        LaunchRoute::Notes
    } else {
        LaunchRoute::Login
    }
}

/// Name shown in the greeting: everything before the first `@`.
///
/// Only a missing email falls back to "User"; an email starting with `@`
/// yields an empty name.
pub fn display_name_from_email(email: Option<&str>) -> String {
    match email {
        Some(email) => email.split('@').next().unwrap_or_default().to_string(),
        None => FALLBACK_DISPLAY_NAME.to_string(),
    }
}

/// Signed-in session summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub owner_id: OwnerId,
    pub email: String,
    pub display_name: String,
}

impl From<Principal> for SessionInfo {
    fn from(value: Principal) -> Self {
        Self {
            display_name: display_name_from_email(Some(&value.email)),
            owner_id: value.owner_id,
            email: value.email,
        }
    }
}

/// Session use-case errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    MissingCredentials,
    Login(AuthError),
    Register(AuthError),
}

impl SessionError {
    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredentials => "Please fill all fields".to_string(),
            Self::Login(err) => format!("Login Failed: {err}"),
            Self::Register(err) => format!("Registration Failed: {err}"),
        }
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "email and password are required"),
            Self::Login(err) => write!(f, "sign-in failed: {err}"),
            Self::Register(err) => write!(f, "registration failed: {err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Login(err) | Self::Register(err) => Some(err),
            Self::MissingCredentials => None,
        }
    }
}

/// Session facade over auth and notifier collaborators.
pub struct SessionService<A, N> {
    auth: A,
    notifier: N,
}

impl<A: AuthProvider, N: Notifier> SessionService<A, N> {
    pub fn new(auth: A, notifier: N) -> Self {
        Self { auth, notifier }
    }

    pub fn launch_route(&self) -> LaunchRoute {
        launch_route(&self.auth)
    }

    /// Returns the active session, if any.
    pub fn current_session(&self) -> Option<SessionInfo> {
        self.auth.current_principal().map(SessionInfo::from)
    }

    /// Signs in with trimmed credentials.
    ///
    /// On success posts "Access Granted".
    pub fn login(&self, email: &str, password: &str) -> Result<SessionInfo, SessionError> {
        let (email, password) = require_credentials(email, password)?;
        let principal = self.auth.sign_in(email, password).map_err(|err| {
            warn!("event=session_login module=service status=error");
            SessionError::Login(err)
        })?;

        info!("event=session_login module=service status=ok");
        self.notifier.post(ACCESS_GRANTED);
        Ok(SessionInfo::from(principal))
    }

    /// Creates an account with trimmed credentials and signs it in.
    pub fn register(&self, email: &str, password: &str) -> Result<SessionInfo, SessionError> {
        let (email, password) = require_credentials(email, password)?;
        let principal = self.auth.register(email, password).map_err(|err| {
            warn!("event=session_register module=service status=error");
            SessionError::Register(err)
        })?;

        info!("event=session_register module=service status=ok");
        Ok(SessionInfo::from(principal))
    }

    /// Closes `feed` (if any), ends the session and posts "Session Ended".
    pub fn logout(&self, feed: Option<&mut NotesFeed>) {
        if let Some(feed) = feed {
            feed.close();
        }
        self.auth.sign_out();
        info!("event=session_logout module=service status=ok");
        self.notifier.post(SESSION_ENDED);
    }
}

fn require_credentials<'a>(
    email: &'a str,
    password: &'a str,
) -> Result<(&'a str, &'a str), SessionError> {
    let email = email.trim();
    let password = password.trim();
    if email.is_empty() || password.is_empty() {
        return Err(SessionError::MissingCredentials);
    }
    Ok((email, password))
}

#[cfg(test)]
mod tests {
    use super::display_name_from_email;

    #[test]
    fn display_name_is_email_local_part() {
        assert_eq!(display_name_from_email(Some("ada@example.com")), "ada");
        assert_eq!(display_name_from_email(Some("no-at-sign")), "no-at-sign");
        assert_eq!(display_name_from_email(Some("a@b@example.com")), "a");
    }

    #[test]
    fn display_name_is_empty_for_blank_local_part_and_user_without_email() {
        assert_eq!(display_name_from_email(Some("@example.com")), "");
        assert_eq!(display_name_from_email(None), "User");
    }
}
