//! SQLite-backed document store with live queries.
//!
//! # Responsibility
//! - Persist notes and serve owner-scoped live queries.
//! - Re-run affected live queries after every successful write and push the
//!   full result set to their listeners.
//!
//! # Invariants
//! - Snapshots are ordered by `timestamp DESC`, ties by insertion order.
//! - Subscribe delivers the initial snapshot before any later write can
//!   publish, because both run under the connection lock.
//! - Failed writes publish nothing.

use crate::db::{open_db, open_db_in_memory};
use crate::model::note::{Note, NoteId, OwnerId};
use crate::store::{
    ListenerHub, ListenerRegistration, LiveQuery, NoteStore, SnapshotListener, StoreError,
    StoreResult, SyncEvent,
};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    title,
    description,
    timestamp
FROM notes";

/// Note store over one SQLite connection.
pub struct SqliteNoteStore {
    conn: Mutex<Connection>,
    hub: ListenerHub,
}

impl SqliteNoteStore {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - Returns `InvalidData` when the `notes` table is missing.
    pub fn new(conn: Connection) -> StoreResult<Self> {
        ensure_notes_table(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            hub: ListenerHub::new(),
        })
    }

    /// Opens (and migrates) a store file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::new(open_db(path)?)
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::new(open_db_in_memory()?)
    }

    /// Number of live queries currently registered.
    pub fn listener_count(&self) -> usize {
        self.hub.len()
    }

    fn lock_conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("note store connection lock poisoned".into()))
    }

    fn publish(&self, conn: &Connection, owners: &[&str]) {
        let mut snapshots: BTreeMap<OwnerId, SyncEvent> = BTreeMap::new();
        let delivered = self.hub.broadcast(|query| {
            if !owners.contains(&query.owner_id.as_str()) {
                return None;
            }
            let event = snapshots
                .entry(query.owner_id.clone())
                .or_insert_with(|| snapshot_event(conn, query));
            Some(event.clone())
        });
        debug!("event=snapshot_publish module=store status=ok listeners={delivered}");
    }
}

impl NoteStore for SqliteNoteStore {
    fn subscribe(
        &self,
        query: LiveQuery,
        listener: SnapshotListener,
    ) -> StoreResult<ListenerRegistration> {
        let conn = self.lock_conn()?;
        listener(snapshot_event(&conn, &query));
        let registration = self.hub.register(query, listener);
        info!(
            "event=live_query_subscribe module=store status=ok listener_id={}",
            registration.id()
        );
        Ok(registration)
    }

    fn get(&self, id: &str) -> StoreResult<Option<Note>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        let note = match rows.next()? {
            Some(row) => Some(parse_note_row(row)?),
            None => None,
        };
        Ok(note)
    }

    fn create(&self, note: &Note) -> StoreResult<NoteId> {
        let conn = self.lock_conn()?;
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO notes (id, owner_id, title, description, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.as_str(),
                note.owner_id.as_str(),
                note.title.as_str(),
                note.description.as_str(),
                note.timestamp,
            ],
        )?;
        info!("event=note_create module=store status=ok");

        self.publish(&conn, &[note.owner_id.as_str()]);
        Ok(id)
    }

    fn update(&self, id: &str, note: &Note) -> StoreResult<()> {
        let conn = self.lock_conn()?;
        let Some(previous_owner) = owner_of(&conn, id)? else {
            warn!("event=note_update module=store status=error error_code=not_found");
            return Err(StoreError::NotFound(id.to_string()));
        };

        conn.execute(
            "UPDATE notes
             SET
                owner_id = ?2,
                title = ?3,
                description = ?4,
                timestamp = ?5
             WHERE id = ?1;",
            params![
                id,
                note.owner_id.as_str(),
                note.title.as_str(),
                note.description.as_str(),
                note.timestamp,
            ],
        )?;
        info!("event=note_update module=store status=ok");

        self.publish(&conn, &[previous_owner.as_str(), note.owner_id.as_str()]);
        Ok(())
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let conn = self.lock_conn()?;
        let Some(owner) = owner_of(&conn, id)? else {
            debug!("event=note_delete module=store status=ok result=already_absent");
            return Ok(());
        };

        conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        info!("event=note_delete module=store status=ok");

        self.publish(&conn, &[owner.as_str()]);
        Ok(())
    }
}

fn snapshot_event(conn: &Connection, query: &LiveQuery) -> SyncEvent {
    match load_snapshot(conn, query) {
        Ok(notes) => SyncEvent::Snapshot(notes),
        Err(err) => {
            warn!("event=live_query_snapshot module=store status=error error={err}");
            SyncEvent::Failed(err.to_string())
        }
    }
}

fn load_snapshot(conn: &Connection, query: &LiveQuery) -> StoreResult<Vec<Note>> {
    let mut stmt = conn.prepare(&format!(
        "{NOTE_SELECT_SQL}
         WHERE owner_id = ?1
         ORDER BY timestamp DESC, seq ASC;"
    ))?;
    let mut rows = stmt.query([query.owner_id.as_str()])?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        notes.push(parse_note_row(row)?);
    }
    Ok(notes)
}

fn parse_note_row(row: &Row<'_>) -> StoreResult<Note> {
    let id: String = row.get("id")?;
    if id.is_empty() {
        return Err(StoreError::InvalidData("empty id in notes.id".to_string()));
    }

    Ok(Note {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        timestamp: row.get("timestamp")?,
        owner_id: row.get("owner_id")?,
    })
}

fn owner_of(conn: &Connection, id: &str) -> StoreResult<Option<OwnerId>> {
    let owner = conn
        .query_row("SELECT owner_id FROM notes WHERE id = ?1;", [id], |row| {
            row.get::<_, String>(0)
        })
        .optional()?;
    Ok(owner)
}

fn ensure_notes_table(conn: &Connection) -> StoreResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'notes'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(StoreError::InvalidData(
            "missing required table `notes`".to_string(),
        ));
    }
    Ok(())
}
