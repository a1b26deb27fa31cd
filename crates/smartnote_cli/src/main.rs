//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `smartnote_core` linkage.
//! - Run an in-memory demo session and print the rendered notes feed.
//!
//! Usage: `smartnote_cli [query]`

use chrono::{Local, Offset};
use smartnote_core::{
    now_epoch_ms, LogNotifier, MemoryAuthProvider, NoteDraft, NoteService,
    NotesFeed, SessionService, SqliteNoteStore,
};
use std::process::ExitCode;

const DEMO_EMAIL: &str = "demo@smartnote.local";
const DEMO_PASSWORD: &str = "demo-password";
const DEMO_NOTES: [(&str, &str); 3] = [
    ("Groceries", "Milk, eggs and coffee beans"),
    ("Trip plan", "Book the train before Friday"),
    ("Reading", "Finish the chapter on ownership"),
];

fn main() -> ExitCode {
    println!("smartnote_core ping={}", smartnote_core::ping());
    println!("smartnote_core version={}", smartnote_core::core_version());

    let query = std::env::args().nth(1).unwrap_or_default();
    match run_demo(&query) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo(query: &str) -> Result<(), String> {
    let store = SqliteNoteStore::open_in_memory().map_err(|err| err.to_string())?;
    let auth = MemoryAuthProvider::new();
    let sessions = SessionService::new(&auth, LogNotifier);
    let session = sessions
        .register(DEMO_EMAIL, DEMO_PASSWORD)
        .map_err(|err| err.user_message())?;
    println!("signed in as {}", session.display_name);

    let notes = NoteService::new(&store, &auth, LogNotifier);
    for (title, description) in DEMO_NOTES {
        notes
            .save_note(&NoteDraft::new(title, description))
            .map_err(|err| err.user_message())?;
    }

    let mut feed = NotesFeed::open(&store, &auth).map_err(|err| err.user_message())?;
    feed.set_query(query);
    let view = feed.render(now_epoch_ms(), Local::now().offset().fix());
    println!(
        "notes total={} shown={} query={:?}",
        view.total_notes,
        view.rows.len(),
        feed.query()
    );
    for row in &view.rows {
        println!("- [{}] {}: {}", row.relative_time_label, row.title, row.description);
    }

    sessions.logout(Some(&mut feed));
    Ok(())
}
