//! Amount-based heuristics: round figures, recurring sums and
//! amounts parked just below authorization thresholds.

use crate::models::{Entry, FlaggedEntry, IdenticalAmount, ThresholdAvoidance};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Common authorization thresholds, in euros, smallest first.
pub const THRESHOLDS: [i64; 8] = [5_000, 10_000, 15_000, 20_000, 25_000, 30_000, 50_000, 100_000];

const IDENTICAL_MIN_OCCURRENCES: usize = 3;
const IDENTICAL_MIN_ACCOUNTS: usize = 2;
const IDENTICAL_MAX_EXAMPLES: usize = 10;

fn is_round_thousand(amount: Decimal) -> bool {
    !amount.is_zero() && (amount % Decimal::from(1000)).is_zero()
}

/// Entries whose debit or credit is a nonzero exact multiple of 1000.
pub fn find_round_amounts(entries: &[Entry]) -> Vec<FlaggedEntry> {
    let flagged: Vec<FlaggedEntry> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| is_round_thousand(e.debit) || is_round_thousand(e.credit))
        .map(|(index, entry)| FlaggedEntry {
            index,
            entry: entry.clone(),
        })
        .collect();

    debug!("Round amount detector: {} findings", flagged.len());
    flagged
}

#[derive(Default)]
struct AmountGroup<'a> {
    occurrences: usize,
    accounts: BTreeSet<&'a str>,
    examples: Vec<&'a Entry>,
}

/// Amounts above 1000 recurring at least three times across two or more
/// accounts, whichever side they are booked on.
pub fn find_identical_amounts(entries: &[Entry]) -> Vec<IdenticalAmount> {
    let mut groups: BTreeMap<Decimal, AmountGroup<'_>> = BTreeMap::new();

    for entry in entries {
        let amount = entry.amount();
        if amount.is_zero() {
            continue;
        }

        let group = groups.entry(amount.round_dp(2).normalize()).or_default();
        group.occurrences += 1;
        if !entry.account.is_empty() {
            group.accounts.insert(&entry.account);
        }
        if group.examples.len() < IDENTICAL_MAX_EXAMPLES {
            group.examples.push(entry);
        }
    }

    let threshold = Decimal::from(1000);
    let suspicious: Vec<IdenticalAmount> = groups
        .into_iter()
        .filter(|(amount, group)| {
            group.occurrences >= IDENTICAL_MIN_OCCURRENCES
                && group.accounts.len() >= IDENTICAL_MIN_ACCOUNTS
                && *amount > threshold
        })
        .map(|(amount, group)| IdenticalAmount {
            amount,
            occurrences: group.occurrences,
            unique_accounts: group.accounts.into_iter().map(String::from).collect(),
            entries: group.examples.into_iter().cloned().collect(),
        })
        .collect();

    debug!("Identical amount detector: {} findings", suspicious.len());
    suspicious
}

/// Positive amounts within 5% below a threshold, attributed to the smallest
/// threshold they fall under.
pub fn detect_threshold_avoidance(entries: &[Entry]) -> Vec<ThresholdAvoidance> {
    let lower_bound = Decimal::new(95, 2);
    let hundred = Decimal::from(100);
    let mut flagged = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let amount = entry.amount();
        if amount <= Decimal::ZERO {
            continue;
        }

        for threshold in THRESHOLDS.iter().copied().map(Decimal::from) {
            if amount >= threshold * lower_bound && amount < threshold {
                flagged.push(ThresholdAvoidance {
                    index,
                    entry: entry.clone(),
                    amount,
                    threshold,
                    percent_below_threshold: ((threshold - amount) / threshold * hundred)
                        .round_dp(2),
                });
                break;
            }
        }
    }

    debug!("Threshold avoidance detector: {} findings", flagged.len());
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{dec, entry};

    #[test]
    fn test_round_amounts() {
        let entries = vec![
            entry("VT", "1", "411000", "5000", "0"),
            entry("VT", "2", "706000", "0", "2000.00"),
            entry("VT", "3", "411000", "1000.50", "0"),
            entry("VT", "4", "411000", "0", "0"),
            entry("VT", "5", "411000", "999", "0"),
        ];

        let flagged = find_round_amounts(&entries);

        let indices: Vec<usize> = flagged.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_identical_amounts_across_accounts() {
        let entries = vec![
            entry("BQ", "1", "512000", "4321.50", "0"),
            entry("BQ", "2", "401000", "0", "4321.5"),
            entry("BQ", "3", "512100", "4321.50", "0"),
            entry("BQ", "4", "512000", "800", "0"),
            entry("BQ", "5", "401000", "800", "0"),
            entry("BQ", "6", "401100", "800", "0"),
        ];

        let found = find_identical_amounts(&entries);

        // 800 recurs too but stays under the 1000 floor
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].amount, dec("4321.5"));
        assert_eq!(found[0].occurrences, 3);
        assert_eq!(found[0].unique_accounts, vec!["401000", "512000", "512100"]);
        assert_eq!(found[0].entries.len(), 3);
    }

    #[test]
    fn test_identical_amounts_single_account_not_flagged() {
        let entries = vec![
            entry("BQ", "1", "512000", "2500", "0"),
            entry("BQ", "2", "512000", "2500", "0"),
            entry("BQ", "3", "512000", "2500", "0"),
        ];
        assert!(find_identical_amounts(&entries).is_empty());
    }

    #[test]
    fn test_identical_amounts_caps_examples() {
        let entries: Vec<_> = (0..15)
            .map(|i| entry("BQ", &i.to_string(), &format!("5120{:02}", i % 3), "1500", "0"))
            .collect();

        let found = find_identical_amounts(&entries);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].occurrences, 15);
        assert_eq!(found[0].entries.len(), 10);
    }

    #[test]
    fn test_threshold_avoidance() {
        let entries = vec![
            entry("AC", "1", "401000", "4800", "0"),
            entry("AC", "2", "401000", "4749.99", "0"),
            entry("AC", "3", "401000", "5000", "0"),
            entry("AC", "4", "401000", "0", "99500"),
        ];

        let flagged = detect_threshold_avoidance(&entries);

        assert_eq!(flagged.len(), 2);
        assert_eq!(flagged[0].index, 0);
        assert_eq!(flagged[0].threshold, dec("5000"));
        assert_eq!(flagged[0].percent_below_threshold, dec("4"));
        assert_eq!(flagged[1].index, 3);
        assert_eq!(flagged[1].threshold, dec("100000"));
    }

    #[test]
    fn test_threshold_attributed_once() {
        // 9600 only sits under 10000; it must not also count for 15000
        let flagged = detect_threshold_avoidance(&[entry("AC", "1", "401000", "9600", "0")]);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].threshold, dec("10000"));
    }
}
