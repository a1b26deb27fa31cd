use smartnote_core::{Note, NoteStore, RemoteSyncChannel, SqliteNoteStore, StoreError, SyncEvent};

fn snapshot_titles(events: Vec<SyncEvent>) -> Vec<Vec<String>> {
    events
        .into_iter()
        .map(|event| match event {
            SyncEvent::Snapshot(notes) => notes.into_iter().map(|note| note.title).collect(),
            SyncEvent::Failed(message) => panic!("unexpected failure: {message}"),
        })
        .collect()
}

#[test]
fn every_write_delivers_a_full_snapshot() {
    let store = SqliteNoteStore::open_in_memory().unwrap();
    let channel = RemoteSyncChannel::open(&store, "u1").unwrap();
    assert_eq!(snapshot_titles(channel.poll()), vec![Vec::<String>::new()]);

    let first = store.create(&Note::new("u1", "A", "x", 100)).unwrap();
    store.create(&Note::new("u1", "B", "y", 200)).unwrap();
    store
        .update(&first, &Note::new("u1", "A2", "x", 300))
        .unwrap();

    assert_eq!(
        snapshot_titles(channel.poll()),
        vec![
            vec!["A".to_string()],
            vec!["B".to_string(), "A".to_string()],
            vec!["A2".to_string(), "B".to_string()],
        ]
    );
}

#[test]
fn snapshots_are_scoped_to_the_owner() {
    let store = SqliteNoteStore::open_in_memory().unwrap();
    let mine = RemoteSyncChannel::open(&store, "u1").unwrap();
    let theirs = RemoteSyncChannel::open(&store, "u2").unwrap();
    mine.poll();
    theirs.poll();

    store.create(&Note::new("u2", "private", "z", 1)).unwrap();

    assert!(mine.poll().is_empty());
    assert_eq!(snapshot_titles(theirs.poll()), vec![vec!["private".to_string()]]);
}

#[test]
fn update_moving_owner_refreshes_both_owners() {
    let store = SqliteNoteStore::open_in_memory().unwrap();
    let id = store.create(&Note::new("u1", "moved", "z", 1)).unwrap();
    let from = RemoteSyncChannel::open(&store, "u1").unwrap();
    let to = RemoteSyncChannel::open(&store, "u2").unwrap();
    from.poll();
    to.poll();

    store.update(&id, &Note::new("u2", "moved", "z", 2)).unwrap();

    assert_eq!(snapshot_titles(from.poll()), vec![Vec::<String>::new()]);
    assert_eq!(snapshot_titles(to.poll()), vec![vec!["moved".to_string()]]);
}

#[test]
fn update_of_missing_note_fails_and_publishes_nothing() {
    let store = SqliteNoteStore::open_in_memory().unwrap();
    let channel = RemoteSyncChannel::open(&store, "u1").unwrap();
    channel.poll();

    let err = store
        .update("missing", &Note::new("u1", "t", "d", 1))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == "missing"));
    store.delete("missing").unwrap();

    assert!(channel.poll().is_empty());
}

#[test]
fn released_channel_stops_receiving_and_unregisters() {
    let store = SqliteNoteStore::open_in_memory().unwrap();
    let mut channel = RemoteSyncChannel::open(&store, "u1").unwrap();
    assert_eq!(store.listener_count(), 1);

    store.create(&Note::new("u1", "queued", "d", 1)).unwrap();
    channel.release();
    channel.release();
    store.create(&Note::new("u1", "late", "d", 2)).unwrap();

    assert!(!channel.is_active());
    assert!(channel.poll().is_empty());
    assert_eq!(store.listener_count(), 0);
}

#[test]
fn dropping_channel_unregisters_listener() {
    let store = SqliteNoteStore::open_in_memory().unwrap();
    {
        let _channel = RemoteSyncChannel::open(&store, "u1").unwrap();
        assert_eq!(store.listener_count(), 1);
    }
    assert_eq!(store.listener_count(), 0);
}

#[test]
fn on_disk_store_keeps_notes_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");

    let store = SqliteNoteStore::open(&path).unwrap();
    store.create(&Note::new("u1", "persisted", "d", 5)).unwrap();
    drop(store);

    let reopened = SqliteNoteStore::open(&path).unwrap();
    let channel = RemoteSyncChannel::open(&reopened, "u1").unwrap();
    assert_eq!(
        snapshot_titles(channel.poll()),
        vec![vec!["persisted".to_string()]]
    );
}
