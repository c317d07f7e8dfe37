//! Posting time and posting day heuristics.

use crate::models::{Entry, FlaggedEntry};
use chrono::{Datelike, Weekday};
use tracing::debug;

/// Late night: from 23:00 up to 05:00.
pub fn is_unusual_hour(hour: u32) -> bool {
    hour >= 23 || hour < 5
}

pub fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Entries posted late at night. Entries without a posting time are skipped.
pub fn find_unusual_transaction_times(entries: &[Entry]) -> Vec<FlaggedEntry> {
    let flagged: Vec<FlaggedEntry> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.posting_hour().is_some_and(is_unusual_hour))
        .map(|(index, entry)| FlaggedEntry {
            index,
            entry: entry.clone(),
        })
        .collect();

    debug!("Unusual time detector: {} findings", flagged.len());
    flagged
}

/// Entries posted on a Saturday or Sunday. Undated entries are skipped.
pub fn find_weekend_transactions(entries: &[Entry]) -> Vec<FlaggedEntry> {
    let flagged: Vec<FlaggedEntry> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.posting_date.is_some_and(|d| is_weekend(d.weekday())))
        .map(|(index, entry)| FlaggedEntry {
            index,
            entry: entry.clone(),
        })
        .collect();

    debug!("Weekend detector: {} findings", flagged.len());
    flagged
}
