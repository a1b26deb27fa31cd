//! Substring search filter.
//!
//! # Invariants
//! - Output is an order-preserving subsequence of the input.
//! - The empty query returns the input unchanged.
//! - A note matches when the lowercased query is contained in its lowercased
//!   title or description. No tokenizing, ranking or fuzzy matching.

use crate::model::note::Note;

/// Filters `notes` by `query`, keeping their order.
pub fn filter_notes(notes: &[Note], query: &str) -> Vec<Note> {
    if query.is_empty() {
        return notes.to_vec();
    }

    let needle = query.to_lowercase();
    notes
        .iter()
        .filter(|note| matches_lowercase(note, &needle))
        .cloned()
        .collect()
}

fn matches_lowercase(note: &Note, needle: &str) -> bool {
    note.title.to_lowercase().contains(needle) || note.description.to_lowercase().contains(needle)
}

/// Remembers the active query so it can be re-applied to every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    query: String,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the active query. The text is kept verbatim.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Applies the active query to `notes`.
    pub fn apply(&self, notes: &[Note]) -> Vec<Note> {
        filter_notes(notes, &self.query)
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_notes, SearchFilter};
    use crate::model::note::Note;

    fn note(id: &str, title: &str, description: &str) -> Note {
        Note::new("owner", title, description, 0).with_id(id)
    }

    fn sample() -> Vec<Note> {
        vec![
            note("1", "Trip", "Packing list"),
            note("2", "Groceries", "Apples and bread"),
            note("3", "PACKAGE tracking", "courier"),
        ]
    }

    #[test]
    fn empty_query_is_identity() {
        let notes = sample();
        assert_eq!(filter_notes(&notes, ""), notes);
    }

    #[test]
    fn matches_title_or_description_case_insensitively() {
        let ids: Vec<String> = filter_notes(&sample(), "pAcK")
            .into_iter()
            .map(|note| note.id)
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn no_match_yields_empty_list() {
        assert!(filter_notes(&sample(), "xyz").is_empty());
    }

    #[test]
    fn query_is_not_tokenized() {
        assert!(filter_notes(&sample(), "apples bread").is_empty());
        assert_eq!(filter_notes(&sample(), "apples and").len(), 1);
    }

    #[test]
    fn whitespace_query_is_matched_literally() {
        let ids: Vec<String> = filter_notes(&sample(), " ")
            .into_iter()
            .map(|note| note.id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(filter_notes(&[note("4", "One", "word")], " ").is_empty());
    }

    #[test]
    fn search_filter_reapplies_remembered_query() {
        let mut filter = SearchFilter::new();
        filter.set_query("a");
        let notes = sample();
        assert_eq!(filter.apply(&notes).len(), 3);

        filter.set_query("");
        assert_eq!(filter.apply(&notes), notes);
        assert_eq!(filter.query(), "");
    }
}
