//! Duplicate entry detection.

use crate::models::{DuplicateEntry, Entry};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

/// Matching key: account, date, piece reference and both amounts.
///
/// The entry number is not part of the key. It tells a duplicate apart
/// from the repeated lines of one multi-line entry.
#[derive(Debug, PartialEq, Eq, Hash)]
struct DuplicateKey<'a> {
    account: &'a str,
    posting_date: Option<NaiveDate>,
    piece_ref: &'a str,
    debit: Decimal,
    credit: Decimal,
}

impl<'a> DuplicateKey<'a> {
    fn of(entry: &'a Entry) -> Self {
        Self {
            account: &entry.account,
            posting_date: entry.posting_date,
            piece_ref: &entry.piece_ref,
            debit: entry.debit.normalize(),
            credit: entry.credit.normalize(),
        }
    }
}

/// Report entries that match an earlier entry under a different entry number.
///
/// Entries without an entry number never participate.
pub fn find_duplicate_entries(entries: &[Entry]) -> Vec<DuplicateEntry> {
    let mut first_seen: HashMap<DuplicateKey<'_>, usize> = HashMap::new();
    let mut duplicates = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        if entry.entry_number.is_empty() {
            continue;
        }

        match first_seen.get(&DuplicateKey::of(entry)) {
            Some(&first_index) => {
                if entries[first_index].entry_number != entry.entry_number {
                    duplicates.push(DuplicateEntry {
                        index,
                        first_index,
                        entry: entry.clone(),
                    });
                }
            }
            None => {
                first_seen.insert(DuplicateKey::of(entry), index);
            }
        }
    }

    debug!("Duplicate detector: {} findings", duplicates.len());
    duplicates
}
