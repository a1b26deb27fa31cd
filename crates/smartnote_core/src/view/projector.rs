//! View projector.
//!
//! # Responsibility
//! - Turn the display list into `NoteRow`s with relative-time labels.
//!
//! # Invariants
//! - Output depends only on its arguments; nothing here reads a clock or
//!   mutates state.
//! - Bucket boundaries use strict `<`, so a difference equal to a boundary
//!   lands in the next bucket.
//! - Labels are computed at render time only and go stale until the next
//!   render.

use crate::model::note::{Note, NoteId};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;

pub const MINUTE_MS: i64 = 60_000;
pub const HOUR_MS: i64 = 3_600_000;
pub const DAY_MS: i64 = 86_400_000;
pub const WEEK_MS: i64 = 604_800_000;

const CALENDAR_DATE_FORMAT: &str = "%b %d, %Y";

/// Relative-time label bucket, ordered from most to least recent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeBucket {
    JustNow,
    Minutes,
    Hours,
    Days,
    CalendarDate,
}

/// Classifies an age in milliseconds.
///
/// Negative ages (timestamps ahead of `now`) count as `JustNow`.
pub fn time_bucket(diff_ms: i64) -> TimeBucket {
    if diff_ms < MINUTE_MS {
        TimeBucket::JustNow
    } else if diff_ms < HOUR_MS {
        TimeBucket::Minutes
    } else if diff_ms < DAY_MS {
        TimeBucket::Hours
    } else if diff_ms < WEEK_MS {
        TimeBucket::Days
    } else {
        TimeBucket::CalendarDate
    }
}

/// Relative-time label with calendar dates rendered in UTC.
pub fn relative_time_label(timestamp_ms: i64, now_ms: i64) -> String {
    relative_time_label_in(timestamp_ms, now_ms, Utc.fix())
}

/// Relative-time label with calendar dates rendered at `offset`.
pub fn relative_time_label_in(timestamp_ms: i64, now_ms: i64, offset: FixedOffset) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    match time_bucket(diff) {
        TimeBucket::JustNow => "Just now".to_string(),
        TimeBucket::Minutes => format!("{} minutes ago", diff / MINUTE_MS),
        TimeBucket::Hours => format!("{} hours ago", diff / HOUR_MS),
        TimeBucket::Days => format!("{} days ago", diff / DAY_MS),
        TimeBucket::CalendarDate => format_calendar_date(timestamp_ms, offset),
    }
}

/// Formats `timestamp_ms` as `Mon DD, YYYY` at `offset`.
///
/// Timestamps outside chrono's range render as the epoch date.
pub fn format_calendar_date(timestamp_ms: i64, offset: FixedOffset) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .with_timezone(&offset)
        .format(CALENDAR_DATE_FORMAT)
        .to_string()
}

/// Builds a fixed offset from minutes east of UTC, falling back to UTC
/// when out of range.
pub fn utc_offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// One renderable list row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteRow {
    pub id: NoteId,
    pub title: String,
    pub description: String,
    pub relative_time_label: String,
}

/// Projects one note at `now_ms`.
pub fn project_row(note: &Note, now_ms: i64, offset: FixedOffset) -> NoteRow {
    NoteRow {
        id: note.id.clone(),
        title: note.title.clone(),
        description: note.description.clone(),
        relative_time_label: relative_time_label_in(note.timestamp, now_ms, offset),
    }
}

/// Projects the display list, keeping its order.
pub fn project_rows(display: &[Note], now_ms: i64, offset: FixedOffset) -> Vec<NoteRow> {
    display
        .iter()
        .map(|note| project_row(note, now_ms, offset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        project_rows, relative_time_label, relative_time_label_in, time_bucket,
        utc_offset_from_minutes, TimeBucket, DAY_MS, HOUR_MS, MINUTE_MS, WEEK_MS,
    };
    use crate::model::note::Note;

    const NOW: i64 = 1_700_000_000_000;

    fn label_for_age(diff: i64) -> String {
        relative_time_label(NOW - diff, NOW)
    }

    #[test]
    fn minute_and_hour_boundaries() {
        assert_eq!(label_for_age(59_999), "Just now");
        assert_eq!(label_for_age(60_000), "1 minutes ago");
        assert_eq!(label_for_age(3_599_999), "59 minutes ago");
        assert_eq!(label_for_age(3_600_000), "1 hours ago");
    }

    #[test]
    fn day_and_week_boundaries() {
        assert_eq!(label_for_age(DAY_MS - 1), "23 hours ago");
        assert_eq!(label_for_age(DAY_MS), "1 days ago");
        assert_eq!(label_for_age(WEEK_MS - 1), "6 days ago");
        assert_eq!(relative_time_label(0, WEEK_MS), "Jan 01, 1970");
    }

    #[test]
    fn zero_and_future_ages_are_just_now() {
        assert_eq!(label_for_age(0), "Just now");
        assert_eq!(relative_time_label(NOW + HOUR_MS, NOW), "Just now");
    }

    #[test]
    fn calendar_date_uses_month_abbreviation_and_offset() {
        // 2023-11-14T22:13:20Z
        let timestamp = 1_700_000_000_000;
        let now = timestamp + 30 * DAY_MS;
        assert_eq!(relative_time_label(timestamp, now), "Nov 14, 2023");
        assert_eq!(
            relative_time_label_in(timestamp, now, utc_offset_from_minutes(120)),
            "Nov 15, 2023"
        );
    }

    #[test]
    fn bucket_is_monotonic_in_age() {
        let ages = [
            -1,
            0,
            MINUTE_MS - 1,
            MINUTE_MS,
            HOUR_MS - 1,
            HOUR_MS,
            DAY_MS - 1,
            DAY_MS,
            WEEK_MS - 1,
            WEEK_MS,
            WEEK_MS * 52,
        ];
        let buckets: Vec<TimeBucket> = ages.iter().map(|age| time_bucket(*age)).collect();
        assert!(buckets.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(buckets.first(), Some(&TimeBucket::JustNow));
        assert_eq!(buckets.last(), Some(&TimeBucket::CalendarDate));
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        assert_eq!(utc_offset_from_minutes(i32::MAX).local_minus_utc(), 0);
        assert_eq!(utc_offset_from_minutes(-300).local_minus_utc(), -300 * 60);
    }

    #[test]
    fn project_rows_keeps_order_and_fields() {
        let display = vec![
            Note::new("o", "A", "first", NOW - 2 * MINUTE_MS).with_id("a"),
            Note::new("o", "B", "second", NOW - 5 * HOUR_MS).with_id("b"),
        ];
        let rows = project_rows(&display, NOW, utc_offset_from_minutes(0));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "a");
        assert_eq!(rows[0].relative_time_label, "2 minutes ago");
        assert_eq!(rows[1].description, "second");
        assert_eq!(rows[1].relative_time_label, "5 hours ago");
    }
}
