//! Journal entry balance check.

use crate::models::{Entry, UnbalancedEntry};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

/// One cent. Absorbs representation noise only, not an accounting allowance.
fn balance_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

#[derive(Default)]
struct EntryGroup<'a> {
    lines: Vec<&'a Entry>,
    debit_total: Decimal,
    credit_total: Decimal,
}

/// Group lines by `(journal, entry number)` and report every group whose
/// debit and credit totals differ by more than one cent.
pub fn check_journal_balance(entries: &[Entry]) -> Vec<UnbalancedEntry> {
    let mut groups: BTreeMap<(&str, &str), EntryGroup<'_>> = BTreeMap::new();

    for entry in entries {
        let group = groups
            .entry((entry.journal_code.as_str(), entry.entry_number.as_str()))
            .or_default();
        group.lines.push(entry);
        group.debit_total += entry.debit;
        group.credit_total += entry.credit;
    }

    let tolerance = balance_tolerance();
    let unbalanced: Vec<UnbalancedEntry> = groups
        .into_iter()
        .filter_map(|((journal, entry_number), group)| {
            let diff = (group.debit_total - group.credit_total).abs();
            (diff > tolerance).then(|| UnbalancedEntry {
                journal_entry_id: format!("{}-{}", journal, entry_number),
                journal: journal.to_string(),
                entry_number: entry_number.to_string(),
                diff,
                entries: group.lines.into_iter().cloned().collect(),
            })
        })
        .collect();

    debug!("Journal balance checker: {} unbalanced entries", unbalanced.len());
    unbalanced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{dec, entry};

    #[test]
    fn test_balanced_entry() {
        let entries = vec![
            entry("VT", "1", "411000", "100", "0"),
            entry("VT", "1", "706000", "0", "100"),
        ];
        assert!(check_journal_balance(&entries).is_empty());
    }

    #[test]
    fn test_unbalanced_entry() {
        let entries = vec![
            entry("VT", "1", "411000", "100", "0"),
            entry("VT", "1", "706000", "0", "99.98"),
        ];

        let unbalanced = check_journal_balance(&entries);

        assert_eq!(unbalanced.len(), 1);
        assert_eq!(unbalanced[0].diff, dec("0.02"));
        assert_eq!(unbalanced[0].journal, "VT");
        assert_eq!(unbalanced[0].entry_number, "1");
        assert_eq!(unbalanced[0].journal_entry_id, "VT-1");
        assert_eq!(unbalanced[0].entries.len(), 2);
    }

    #[test]
    fn test_one_cent_is_tolerated() {
        let entries = vec![
            entry("VT", "1", "411000", "100", "0"),
            entry("VT", "1", "706000", "0", "99.99"),
        ];
        assert!(check_journal_balance(&entries).is_empty());
    }

    #[test]
    fn test_groups_are_per_journal() {
        // Same entry number in two journals must not offset each other
        let entries = vec![
            entry("VT", "7", "411000", "50", "0"),
            entry("AC", "7", "401000", "0", "50"),
        ];

        let unbalanced = check_journal_balance(&entries);

        assert_eq!(unbalanced.len(), 2);
        assert_eq!(unbalanced[0].journal, "AC");
        assert_eq!(unbalanced[1].journal, "VT");
    }
}
