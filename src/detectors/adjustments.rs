//! Label-driven heuristics: period-end adjustments, accounts adjusted over
//! and over, and large entries with vague labels.

use super::{is_adjustment_label, SUSPICIOUS_TERMS};
use crate::models::{EndOfPeriodAdjustments, Entry, FlaggedEntry, FrequentAdjustment};
use chrono::Datelike;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

const END_OF_MONTH_FIRST_DAY: u32 = 28;
const FREQUENT_ADJUSTMENT_MIN: usize = 4;
const LARGE_ENTRY_AMOUNT: i64 = 50_000;

/// Adjustment entries posted on or after the 28th, split into year-end,
/// quarter-end and month-end buckets (first match wins).
pub fn find_end_of_period_adjustments(entries: &[Entry]) -> EndOfPeriodAdjustments {
    let mut result = EndOfPeriodAdjustments::default();

    for (index, entry) in entries.iter().enumerate() {
        let Some(date) = entry.posting_date else {
            continue;
        };
        if date.day() < END_OF_MONTH_FIRST_DAY || !is_adjustment_label(&entry.label_lowercase()) {
            continue;
        }

        let flagged = FlaggedEntry {
            index,
            entry: entry.clone(),
        };
        match date.month() {
            12 => result.year_end.push(flagged),
            3 | 6 | 9 => result.quarter_end.push(flagged),
            _ => result.month_end.push(flagged),
        }
    }

    debug!(
        "End-of-period detector: {} year-end, {} quarter-end, {} month-end",
        result.year_end.len(),
        result.quarter_end.len(),
        result.month_end.len()
    );
    result
}

/// Accounts carrying more than three adjustment-labelled entries.
pub fn detect_frequent_adjustments(entries: &[Entry]) -> Vec<FrequentAdjustment> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for entry in entries {
        if entry.account.is_empty() {
            continue;
        }
        let count = counts.entry(entry.account.as_str()).or_default();
        if is_adjustment_label(&entry.label_lowercase()) {
            *count += 1;
        }
    }

    let frequent: Vec<FrequentAdjustment> = counts
        .into_iter()
        .filter(|(_, count)| *count >= FREQUENT_ADJUSTMENT_MIN)
        .map(|(account, count)| FrequentAdjustment {
            account: account.to_string(),
            count,
        })
        .collect();

    debug!("Frequent adjustment detector: {} accounts", frequent.len());
    frequent
}

/// Entries above 50,000 on either side whose label uses a vague or
/// suspicious term.
pub fn detect_unusual_journal_entries(entries: &[Entry]) -> Vec<FlaggedEntry> {
    let limit = Decimal::from(LARGE_ENTRY_AMOUNT);

    let flagged: Vec<FlaggedEntry> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.debit > limit || e.credit > limit)
        .filter(|(_, e)| {
            let label = e.label_lowercase();
            SUSPICIOUS_TERMS.iter().any(|term| label.contains(term))
        })
        .map(|(index, entry)| FlaggedEntry {
            index,
            entry: entry.clone(),
        })
        .collect();

    debug!("Unusual journal entry detector: {} findings", flagged.len());
    flagged
}
