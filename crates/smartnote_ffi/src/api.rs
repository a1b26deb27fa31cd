//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own the process-wide store, session, notes feed and notification outbox.
//! - Keep notes, accounts and the signed-in session in one SQLite file.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported through `ok=false` envelopes with a user message.
//! - At most one notes feed is open; opening a new one closes the previous.

use log::warn;
use once_cell::sync::OnceCell;
use smartnote_core::view::projector::utc_offset_from_minutes;
use smartnote_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, launch_route,
    ping as ping_inner, relative_time_label_in, FeedView, LaunchRoute, NoteDraft,
    NoteService, NotesFeed, NotificationOutbox, SessionInfo, SessionService, SqliteAuthProvider,
    SqliteNoteStore,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

const STORE_DB_FILE_NAME: &str = "smartnote_store.sqlite3";
static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static APP_STATE: OnceCell<Mutex<AppState>> = OnceCell::new();

struct AppState {
    store: Arc<SqliteNoteStore>,
    auth: Arc<SqliteAuthProvider>,
    outbox: Arc<NotificationOutbox>,
    feed: Option<NotesFeed>,
}

impl AppState {
    fn open() -> Result<Self, String> {
        let db_path = resolve_store_db_path();
        let store = SqliteNoteStore::open(&db_path)
            .map_err(|err| format!("note store open failed: {err}"))?;
        let auth = SqliteAuthProvider::open(&db_path)
            .map_err(|err| format!("auth store open failed: {err}"))?;
        Ok(Self {
            store: Arc::new(store),
            auth: Arc::new(auth),
            outbox: Arc::new(NotificationOutbox::new()),
            feed: None,
        })
    }

    fn sessions(&self) -> SessionService<Arc<SqliteAuthProvider>, Arc<NotificationOutbox>> {
        SessionService::new(Arc::clone(&self.auth), Arc::clone(&self.outbox))
    }

    fn notes(
        &self,
    ) -> NoteService<Arc<SqliteNoteStore>, Arc<SqliteAuthProvider>, Arc<NotificationOutbox>> {
        NoteService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.auth),
            Arc::clone(&self.outbox),
        )
    }
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope for note writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected note ID on success.
    pub note_id: Option<String>,
    /// User-facing toast text.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, note_id: String) -> Self {
        Self {
            ok: true,
            note_id: Some(note_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note_id: None,
            message: message.into(),
        }
    }
}

/// Session response envelope for login, registration and launch checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResponse {
    pub ok: bool,
    pub owner_id: Option<String>,
    /// Greeting name (email local part).
    pub display_name: Option<String>,
    pub message: String,
}

impl SessionResponse {
    fn signed_in(session: SessionInfo, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            owner_id: Some(session.owner_id),
            display_name: Some(session.display_name),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            owner_id: None,
            display_name: None,
            message: message.into(),
        }
    }
}

/// One rendered notes-list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    pub note_id: String,
    pub title: String,
    pub description: String,
    pub relative_time_label: String,
}

/// Notes screen render envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    /// False when no feed is open or it could not be opened.
    pub ok: bool,
    /// Size of the unfiltered list.
    pub total_notes: u32,
    /// Rows matching the current query, newest first.
    pub rows: Vec<FeedRow>,
    /// True when the user has no notes at all.
    pub is_empty: bool,
    /// Non-fatal sync notice; the rows still show the last good list.
    pub notice: Option<String>,
    pub message: String,
}

impl FeedResponse {
    fn rendered(view: FeedView) -> Self {
        let message = match view.rows.len() {
            0 if view.is_empty => "No notes yet.".to_string(),
            0 => "No results.".to_string(),
            count => format!("Showing {count} note(s)."),
        };
        Self {
            ok: true,
            total_notes: u32::try_from(view.total_notes).unwrap_or(u32::MAX),
            rows: view.rows.into_iter().map(to_feed_row).collect(),
            is_empty: view.is_empty,
            notice: view.notice,
            message,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            total_notes: 0,
            rows: Vec::new(),
            is_empty: true,
            notice: None,
            message: message.into(),
        }
    }
}

/// Notification waiting to be displayed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    pub title: String,
    pub message: String,
}

/// Returns the start screen: `notes` with an active session, else `login`.
#[flutter_rust_bridge::frb(sync)]
pub fn session_launch_route() -> String {
    let route = with_state(|state| launch_route(state.auth.as_ref()))
        .unwrap_or(LaunchRoute::Login);
    match route {
        LaunchRoute::Notes => "notes".to_string(),
        LaunchRoute::Login => "login".to_string(),
    }
}

/// Creates an account and signs it in.
///
/// # FFI contract
/// - Never panics.
/// - Returns owner id and display name on success.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_register(email: String, password: String) -> SessionResponse {
    with_state(|state| match state.sessions().register(&email, &password) {
        Ok(session) => SessionResponse::signed_in(session, "Account created."),
        Err(err) => SessionResponse::failure(err.user_message()),
    })
    .unwrap_or_else(SessionResponse::failure)
}

/// Signs in with email and password.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_login(email: String, password: String) -> SessionResponse {
    with_state(|state| match state.sessions().login(&email, &password) {
        Ok(session) => {
            let greeting = format!("Welcome, {}", session.display_name);
            SessionResponse::signed_in(session, greeting)
        }
        Err(err) => SessionResponse::failure(err.user_message()),
    })
    .unwrap_or_else(SessionResponse::failure)
}

/// Closes the open feed and ends the session.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_logout() -> SessionResponse {
    with_state(|state| {
        let sessions = state.sessions();
        sessions.logout(state.feed.as_mut());
        state.feed = None;
        SessionResponse {
            ok: true,
            owner_id: None,
            display_name: None,
            message: "Logged out.".to_string(),
        }
    })
    .unwrap_or_else(SessionResponse::failure)
}

/// Opens the notes feed for the signed-in user and renders it.
///
/// # FFI contract
/// - Replaces any previously open feed.
/// - Returns `ok=false` without touching the store when nobody is signed in.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_open(now_ms: i64, utc_offset_minutes: i32) -> FeedResponse {
    with_state(|state| {
        if let Some(mut previous) = state.feed.take() {
            previous.close();
        }
        match NotesFeed::open(state.store.as_ref(), state.auth.as_ref()) {
            Ok(feed) => {
                let response = render_feed(&feed, now_ms, utc_offset_minutes);
                state.feed = Some(feed);
                response
            }
            Err(err) => FeedResponse::failure(err.user_message()),
        }
    })
    .unwrap_or_else(FeedResponse::failure)
}

/// Applies queued snapshots to the open feed and renders it.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_pump(now_ms: i64, utc_offset_minutes: i32) -> FeedResponse {
    with_open_feed(|feed| {
        feed.pump();
        render_feed(feed, now_ms, utc_offset_minutes)
    })
}

/// Replaces the search query and renders the filtered feed.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_set_query(query: String, now_ms: i64, utc_offset_minutes: i32) -> FeedResponse {
    with_open_feed(|feed| {
        feed.set_query(query);
        render_feed(feed, now_ms, utc_offset_minutes)
    })
}

/// Re-renders the open feed without applying queued snapshots.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_render(now_ms: i64, utc_offset_minutes: i32) -> FeedResponse {
    with_open_feed(|feed| render_feed(feed, now_ms, utc_offset_minutes))
}

/// Releases the open feed, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_close() -> bool {
    with_state(|state| match state.feed.take() {
        Some(mut feed) => {
            feed.close();
            true
        }
        None => false,
    })
    .unwrap_or(false)
}

/// Creates (`note_id=None`) or replaces a note.
///
/// # FFI contract
/// - Title and description are trimmed and required.
/// - The open feed picks the change up on the next `feed_pump`.
#[flutter_rust_bridge::frb(sync)]
pub fn note_save(note_id: Option<String>, title: String, description: String) -> ActionResponse {
    let draft = NoteDraft {
        id: note_id,
        title,
        description,
    };
    with_state(|state| match state.notes().save_note(&draft) {
        Ok(outcome) => ActionResponse::success(outcome.message, outcome.note_id),
        Err(err) => ActionResponse::failure(err.user_message()),
    })
    .unwrap_or_else(ActionResponse::failure)
}

/// Deletes one note by id.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(note_id: String) -> ActionResponse {
    with_state(|state| match state.notes().delete_note(&note_id) {
        Ok(outcome) => ActionResponse::success(outcome.message, outcome.note_id),
        Err(err) => ActionResponse::failure(err.user_message()),
    })
    .unwrap_or_else(ActionResponse::failure)
}

/// Drains notifications posted since the last call, oldest first.
///
/// The host shows them only when it holds notification permission.
#[flutter_rust_bridge::frb(sync)]
pub fn take_notifications() -> Vec<NotificationItem> {
    with_state(|state| {
        state
            .outbox
            .take()
            .into_iter()
            .map(|notification| NotificationItem {
                title: notification.title,
                message: notification.message,
            })
            .collect()
    })
    .unwrap_or_default()
}

/// Formats the list-row time label for `timestamp_ms` at `now_ms`.
#[flutter_rust_bridge::frb(sync)]
pub fn relative_time_label(timestamp_ms: i64, now_ms: i64, utc_offset_minutes: i32) -> String {
    relative_time_label_in(
        timestamp_ms,
        now_ms,
        utc_offset_from_minutes(utc_offset_minutes),
    )
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("SMARTNOTE_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(STORE_DB_FILE_NAME)
        })
        .clone()
}

fn with_state<T>(f: impl FnOnce(&mut AppState) -> T) -> Result<T, String> {
    let state = APP_STATE
        .get_or_try_init(|| AppState::open().map(Mutex::new))
        .map_err(|err| {
            warn!("event=ffi_state_init module=ffi status=error error={err}");
            err
        })?;
    let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(f(&mut guard))
}

fn with_open_feed(f: impl FnOnce(&mut NotesFeed) -> FeedResponse) -> FeedResponse {
    with_state(|state| match state.feed.as_mut() {
        Some(feed) => f(feed),
        None => FeedResponse::failure("Notes feed is not open."),
    })
    .unwrap_or_else(FeedResponse::failure)
}

fn render_feed(feed: &NotesFeed, now_ms: i64, utc_offset_minutes: i32) -> FeedResponse {
    FeedResponse::rendered(feed.render(now_ms, utc_offset_from_minutes(utc_offset_minutes)))
}

fn to_feed_row(row: smartnote_core::NoteRow) -> FeedRow {
    FeedRow {
        note_id: row.id,
        title: row.title,
        description: row.description,
        relative_time_label: row.relative_time_label,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        auth_login, auth_logout, auth_register, core_version, feed_close, feed_open, feed_pump,
        feed_render, feed_set_query, init_logging, note_delete, note_save, ping,
        relative_time_label, resolve_store_db_path, session_launch_route, take_notifications,
    };
    use smartnote_core::{AuthProvider, SqliteAuthProvider};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    const NOW_MS: i64 = 1_700_000_000_000;

    // All tests share one process-wide session.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        TEST_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh_account() -> String {
        let email = format!("user-{}@example.com", uuid::Uuid::new_v4().simple());
        let response = auth_register(email.clone(), "secret123".to_string());
        assert!(response.ok, "{}", response.message);
        email
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn relative_time_label_applies_offset() {
        assert_eq!(relative_time_label(NOW_MS - 5_000, NOW_MS, 0), "Just now");
        assert_eq!(
            relative_time_label(NOW_MS - 9 * 86_400_000, NOW_MS, 0),
            "Nov 05, 2023"
        );
    }

    #[test]
    fn feed_requires_session() {
        let _guard = serial();
        fresh_account();
        auth_logout();
        take_notifications();

        assert_eq!(session_launch_route(), "login");
        let response = feed_open(NOW_MS, 0);
        assert!(!response.ok);
        assert_eq!(response.message, "Please log in to see your notes.");

        let save = note_save(None, "Title".to_string(), "Body".to_string());
        assert!(!save.ok);
        assert!(take_notifications().is_empty());
    }

    #[test]
    fn save_then_pump_shows_note_and_filters() {
        let _guard = serial();
        fresh_account();
        take_notifications();
        assert_eq!(session_launch_route(), "notes");

        let opened = feed_open(NOW_MS, 0);
        assert!(opened.ok, "{}", opened.message);
        assert!(opened.is_empty);

        let first = note_save(None, " Groceries ".to_string(), "Milk".to_string());
        assert!(first.ok, "{}", first.message);
        assert_eq!(first.message, "Note saved!");
        let second = note_save(None, "Trip".to_string(), "Pack bags".to_string());
        assert!(second.ok, "{}", second.message);

        let pumped = feed_pump(NOW_MS, 0);
        assert_eq!(pumped.total_notes, 2);
        assert!(pumped
            .rows
            .iter()
            .any(|row| row.note_id == first.note_id.clone().unwrap_or_default()
                && row.title == "Groceries"));

        let filtered = feed_set_query("MILK".to_string(), NOW_MS, 0);
        assert_eq!(filtered.total_notes, 2);
        assert_eq!(filtered.rows.len(), 1);
        assert_eq!(filtered.rows[0].title, "Groceries");

        let notifications = take_notifications();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].title, "New Note Created");

        assert!(feed_close());
        assert!(!feed_render(NOW_MS, 0).ok);
    }

    #[test]
    fn update_and_delete_flow_through_feed() {
        let _guard = serial();
        fresh_account();
        feed_open(NOW_MS, 0);
        let created = note_save(None, "Draft".to_string(), "v1".to_string());
        let note_id = created.note_id.expect("create should return note id");

        let updated = note_save(Some(note_id.clone()), "Final".to_string(), "v2".to_string());
        assert!(updated.ok, "{}", updated.message);
        assert_eq!(updated.message, "Note updated!");
        let view = feed_pump(NOW_MS, 0);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].title, "Final");

        let deleted = note_delete(note_id);
        assert!(deleted.ok, "{}", deleted.message);
        assert_eq!(deleted.message, "Note deleted successfully");
        let view = feed_pump(NOW_MS, 0);
        assert!(view.is_empty);
        assert_eq!(view.message, "No notes yet.");

        let invalid = note_save(None, "   ".to_string(), "body".to_string());
        assert!(!invalid.ok);
        assert_eq!(invalid.message, "Please enter a title");
        feed_close();
    }

    #[test]
    fn logout_closes_feed_and_login_restores_notes() {
        let _guard = serial();
        let email = fresh_account();
        feed_open(NOW_MS, 0);
        assert!(note_save(None, "Kept".to_string(), "body".to_string()).ok);
        take_notifications();

        let logout = auth_logout();
        assert!(logout.ok);
        assert!(!feed_render(NOW_MS, 0).ok);
        assert_eq!(take_notifications()[0].title, "Session Ended");

        let bad = auth_login(email.clone(), "wrong-password".to_string());
        assert!(!bad.ok);
        assert!(bad.message.starts_with("Login Failed: "));
        let blank = auth_login(" ".to_string(), "x".to_string());
        assert_eq!(blank.message, "Please fill all fields");

        let login = auth_login(email, "secret123".to_string());
        assert!(login.ok, "{}", login.message);
        let reopened = feed_open(NOW_MS, 0);
        assert_eq!(reopened.total_notes, 1);
        assert_eq!(reopened.rows[0].title, "Kept");
        feed_close();
    }

    #[test]
    fn session_is_restored_from_reopened_database() {
        let _guard = serial();
        let email = fresh_account();
        let session = auth_login(email, "secret123".to_string());
        assert!(session.ok, "{}", session.message);

        let reopened = SqliteAuthProvider::open(resolve_store_db_path())
            .expect("auth store should reopen");
        assert_eq!(reopened.current_owner_id(), session.owner_id);
        assert_eq!(session_launch_route(), "notes");

        auth_logout();
        assert_eq!(reopened.current_owner_id(), None);
        take_notifications();
    }
}
