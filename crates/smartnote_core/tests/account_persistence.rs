use smartnote_core::{
    launch_route, AuthError, AuthProvider, LaunchRoute, Note, NoteDraft, NoteService, NoteStore,
    NotesFeed, NotificationOutbox, SessionService, SqliteAuthProvider, SqliteNoteStore,
};
use std::path::Path;

fn open_app(path: &Path) -> (SqliteNoteStore, SqliteAuthProvider) {
    let store = SqliteNoteStore::open(path).unwrap();
    let auth = SqliteAuthProvider::open(path).unwrap();
    (store, auth)
}

#[test]
fn session_and_notes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("smartnote.db");

    let owner_id = {
        let (store, auth) = open_app(&path);
        let outbox = NotificationOutbox::new();
        let session = SessionService::new(&auth, &outbox)
            .register("ada@example.com", "secret1")
            .unwrap();
        NoteService::new(&store, &auth, &outbox)
            .save_note(&NoteDraft::new("Kept", "body"))
            .unwrap();
        session.owner_id
    };

    let (store, auth) = open_app(&path);
    assert_eq!(launch_route(&auth), LaunchRoute::Notes);
    assert_eq!(auth.current_owner_id(), Some(owner_id));

    let feed = NotesFeed::open(&store, &auth).unwrap();
    let titles: Vec<&str> = feed.notes().iter().map(|note| note.title.as_str()).collect();
    assert_eq!(titles, vec!["Kept"]);
}

#[test]
fn login_after_reopen_keeps_owner_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("smartnote.db");

    let owner_id = {
        let (store, auth) = open_app(&path);
        let principal = auth.register("ada@example.com", "secret1").unwrap();
        store
            .create(&Note::new(principal.owner_id.clone(), "Kept", "body", 1))
            .unwrap();
        auth.sign_out();
        principal.owner_id
    };

    let (store, auth) = open_app(&path);
    assert_eq!(launch_route(&auth), LaunchRoute::Login);
    assert_eq!(
        auth.sign_in("ada@example.com", "wrong-pass").unwrap_err(),
        AuthError::InvalidCredentials
    );
    assert!(matches!(
        auth.register("ada@example.com", "another1"),
        Err(AuthError::AccountExists(_))
    ));

    let principal = auth.sign_in("ada@example.com", "secret1").unwrap();
    assert_eq!(principal.owner_id, owner_id);
    let feed = NotesFeed::open(&store, &auth).unwrap();
    assert_eq!(feed.total_count(), 1);
}
