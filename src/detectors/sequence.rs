//! Entry numbering continuity per journal.

use crate::models::{Entry, SequenceGap};
use std::collections::BTreeMap;
use tracing::debug;

/// Report every hole in the numeric entry numbering of each journal.
///
/// Non-numeric entry numbers are left out of the sequence entirely.
pub fn find_sequence_gaps(entries: &[Entry]) -> Vec<SequenceGap> {
    let mut sequences: BTreeMap<&str, Vec<i64>> = BTreeMap::new();

    for entry in entries {
        if let Ok(number) = entry.entry_number.trim().parse::<i64>() {
            sequences
                .entry(entry.journal_code.as_str())
                .or_default()
                .push(number);
        }
    }

    let mut gaps = Vec::new();
    for (journal, mut numbers) in sequences {
        numbers.sort_unstable();
        for pair in numbers.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let span = i128::from(to) - i128::from(from);
            if span > 1 {
                gaps.push(SequenceGap {
                    journal: journal.to_string(),
                    from,
                    to,
                    missing: i64::try_from(span - 1).unwrap_or(i64::MAX),
                });
            }
        }
    }

    debug!("Sequence gap detector: {} findings", gaps.len());
    gaps
}
