//! Aggregation and statistics.
//!
//! This module turns raw entries and detector findings into per-journal,
//! per-account and per-month summaries. Every grouping goes through an
//! ordered map so the output is stable from run to run.

use super::{patterns, risk};
use crate::detectors::timing::is_weekend;
use crate::models::{
    AccountStats, ActivityProfile, AnalysisResult, AnalyticsResult, Entry, JournalAnomalies,
    JournalStats, PeriodAnomalies,
};
use chrono::Datelike;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Label fragments counted as journal-level anomalies.
const JOURNAL_ANOMALY_TERMS: &[&str] = &["divers", "ajust", "régul", "correct"];

const LARGE_ROUND_AMOUNT: i64 = 1_000;
const MIN_ACCOUNT_TRANSACTIONS: usize = 5;
const TOP_ACCOUNTS: usize = 20;
const JOURNAL_ACCOUNT_SAMPLE: usize = 5;

/// Build the aggregated view of one analysis run.
///
/// `analysis` must come from `analyze(entries)`.
pub fn aggregate(entries: &[Entry], analysis: &AnalysisResult) -> AnalyticsResult {
    let categories = risk::anomaly_categories(analysis);
    let total_count = categories.iter().map(|c| c.count).sum();
    let risk_score = risk::calculate_risk_score(&categories);

    let result = AnalyticsResult {
        journals: journal_stats(entries),
        accounts: account_stats(entries),
        activity: activity_profile(entries),
        journal_anomalies: journal_anomalies(entries, analysis),
        periods: period_anomalies(analysis),
        amount_patterns: patterns::detect_amount_patterns(entries),
        categories,
        total_count,
        risk_score,
    };

    debug!(
        "Aggregated {} journals, {} accounts, {} periods; risk score {}",
        result.journals.len(),
        result.accounts.len(),
        result.periods.len(),
        result.risk_score
    );
    result
}

/// Round a rate to four decimal places.
fn round_rate(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round_rate(count as f64 / total as f64)
    }
}

/// Whole amount strictly above 1,000.
fn is_large_round(amount: Decimal) -> bool {
    amount > Decimal::from(LARGE_ROUND_AMOUNT) && amount.fract().is_zero()
}

fn journal_name(entry: &Entry) -> String {
    if entry.journal_label.is_empty() {
        entry.journal_code.clone()
    } else {
        entry.journal_label.clone()
    }
}

#[derive(Default)]
struct JournalAccumulator<'a> {
    name: String,
    entries: usize,
    debit: Decimal,
    credit: Decimal,
    accounts: BTreeSet<&'a str>,
    weekend_count: usize,
    evening_count: usize,
    anomaly_count: usize,
}

/// Per-journal volume, timing and label statistics, busiest journal first.
pub fn journal_stats(entries: &[Entry]) -> Vec<JournalStats> {
    let mut journals: BTreeMap<&str, JournalAccumulator> = BTreeMap::new();

    for entry in entries {
        if entry.journal_code.is_empty() {
            continue;
        }
        let journal = journals
            .entry(entry.journal_code.as_str())
            .or_insert_with(|| JournalAccumulator {
                name: journal_name(entry),
                ..Default::default()
            });

        journal.entries += 1;
        journal.debit += entry.debit;
        journal.credit += entry.credit;

        if let Some(date) = entry.posting_date {
            if is_weekend(date.weekday()) {
                journal.weekend_count += 1;
            }
            if let Some(hour) = entry.posting_hour() {
                if !(8..19).contains(&hour) {
                    journal.evening_count += 1;
                }
            }
        }

        if !entry.account.is_empty() {
            journal.accounts.insert(entry.account.as_str());
        }

        let label = entry.label_lowercase();
        if JOURNAL_ANOMALY_TERMS.iter().any(|term| label.contains(term)) {
            journal.anomaly_count += 1;
        }
        if is_large_round(entry.debit) || is_large_round(entry.credit) {
            journal.anomaly_count += 1;
        }
    }

    let mut stats: Vec<JournalStats> = journals
        .into_iter()
        .map(|(code, acc)| JournalStats {
            journal: code.to_string(),
            name: acc.name,
            entries: acc.entries,
            debit: acc.debit,
            credit: acc.credit,
            balance: (acc.debit - acc.credit).round_dp(2),
            account_count: acc.accounts.len(),
            accounts: acc
                .accounts
                .iter()
                .take(JOURNAL_ACCOUNT_SAMPLE)
                .map(|a| a.to_string())
                .collect(),
            weekend_count: acc.weekend_count,
            evening_count: acc.evening_count,
            anomaly_count: acc.anomaly_count,
            weekend_rate: rate(acc.weekend_count, acc.entries),
            evening_rate: rate(acc.evening_count, acc.entries),
            anomaly_rate: rate(acc.anomaly_count, acc.entries),
        })
        .collect();

    stats.sort_by_key(|j| Reverse(j.entries));
    stats
}

/// Attribute detector findings to the journal they belong to.
///
/// Only journals with at least one finding are returned, most affected first.
pub fn journal_anomalies(entries: &[Entry], analysis: &AnalysisResult) -> Vec<JournalAnomalies> {
    let mut journals: BTreeMap<&str, JournalAnomalies> = BTreeMap::new();
    for entry in entries.iter().filter(|e| !e.journal_code.is_empty()) {
        journals
            .entry(entry.journal_code.as_str())
            .or_insert_with(|| JournalAnomalies {
                journal: entry.journal_code.clone(),
                name: journal_name(entry),
                ..Default::default()
            });
    }

    let anomalies = &analysis.anomalies;
    let mut bump = |journal: &str, field: fn(&mut JournalAnomalies) -> &mut usize| {
        if let Some(stats) = journals.get_mut(journal) {
            *field(stats) += 1;
            stats.total += 1;
        }
    };

    for d in &anomalies.duplicate_entries {
        bump(&d.entry.journal_code, |s| &mut s.duplicates);
    }
    for u in &anomalies.unbalanced_entries {
        bump(&u.journal, |s| &mut s.unbalanced);
    }
    for r in &anomalies.round_amounts {
        bump(&r.entry.journal_code, |s| &mut s.round_amounts);
    }
    for w in &anomalies.weekend_transactions {
        bump(&w.entry.journal_code, |s| &mut s.weekend_transactions);
    }
    for g in &anomalies.sequence_gaps {
        bump(&g.journal, |s| &mut s.sequence_gaps);
    }
    for t in &anomalies.unusual_transaction_times {
        bump(&t.entry.journal_code, |s| &mut s.unusual_timing);
    }

    let mut result: Vec<JournalAnomalies> = journals.into_values().filter(|j| j.total > 0).collect();
    result.sort_by_key(|j| Reverse(j.total));
    result
}

/// Bucket dated findings by `YYYY-MM` month.
///
/// Unbalanced groups carry no single date, so their count is spread evenly
/// (rounded up) over the months that already hold findings.
pub fn period_anomalies(analysis: &AnalysisResult) -> Vec<PeriodAnomalies> {
    let mut months: BTreeMap<String, PeriodAnomalies> = BTreeMap::new();
    let mut bump = |entry: &Entry, field: fn(&mut PeriodAnomalies) -> &mut usize| {
        let Some(period) = entry.period() else {
            return;
        };
        let stats = months
            .entry(period.clone())
            .or_insert_with(|| PeriodAnomalies {
                period,
                ..Default::default()
            });
        *field(stats) += 1;
        stats.total += 1;
    };

    let anomalies = &analysis.anomalies;
    for d in &anomalies.duplicate_entries {
        bump(&d.entry, |s| &mut s.duplicates);
    }
    for r in &anomalies.round_amounts {
        bump(&r.entry, |s| &mut s.round_amounts);
    }
    for w in &anomalies.weekend_transactions {
        bump(&w.entry, |s| &mut s.weekend_transactions);
    }
    for t in &anomalies.unusual_transaction_times {
        bump(&t.entry, |s| &mut s.unusual_timing);
    }

    let unbalanced = anomalies.unbalanced_entries.len();
    if unbalanced > 0 && !months.is_empty() {
        let per_month = unbalanced.div_ceil(months.len());
        for stats in months.values_mut() {
            stats.unbalanced += per_month;
            stats.total += per_month;
        }
    }

    months.into_values().collect()
}

#[derive(Default)]
struct AccountAccumulator {
    transactions: usize,
    debit: Decimal,
    credit: Decimal,
    anomalies: usize,
}

/// Busiest accounts (more than five transactions), top twenty by volume.
pub fn account_stats(entries: &[Entry]) -> Vec<AccountStats> {
    let mut accounts: BTreeMap<&str, AccountAccumulator> = BTreeMap::new();

    for entry in entries {
        if entry.account.is_empty() {
            continue;
        }
        let account = accounts.entry(entry.account.as_str()).or_default();
        account.transactions += 1;
        account.debit += entry.debit;
        account.credit += entry.credit;

        if entry.debit == entry.credit && entry.debit > Decimal::ZERO {
            account.anomalies += 1;
        }
        if is_large_round(entry.debit) {
            account.anomalies += 1;
        }
        if is_large_round(entry.credit) {
            account.anomalies += 1;
        }
    }

    let mut busy: Vec<(&str, AccountAccumulator)> = accounts
        .into_iter()
        .filter(|(_, acc)| acc.transactions > MIN_ACCOUNT_TRANSACTIONS)
        .collect();
    busy.sort_by_key(|(_, acc)| Reverse(acc.debit + acc.credit));
    busy.truncate(TOP_ACCOUNTS);

    busy.into_iter()
        .map(|(account, acc)| AccountStats {
            account: account.to_string(),
            transactions: acc.transactions,
            amount: acc.debit + acc.credit,
            balance: acc.debit - acc.credit,
            anomaly_ratio: (Decimal::from(acc.anomalies) / Decimal::from(acc.transactions))
                .to_f64()
                .unwrap_or_default(),
        })
        .collect()
}

/// Dated-entry counts per calendar month and per weekday.
pub fn activity_profile(entries: &[Entry]) -> ActivityProfile {
    let mut profile = ActivityProfile::default();
    for date in entries.iter().filter_map(|e| e.posting_date) {
        profile.by_month[date.month0() as usize] += 1;
        profile.by_weekday[date.weekday().num_days_from_monday() as usize] += 1;
    }
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::detectors::fixtures::{date, dec, entry, labelled, time};

    #[test]
    fn test_journal_stats() {
        let mut evening = entry("VT", "2", "411000", "300", "0");
        evening.posting_time = time(20, 15);
        let mut morning = entry("VT", "2", "706000", "0", "300");
        morning.posting_time = time(9, 0);
        let mut weekend = entry("BQ", "1", "512000", "2000", "0");
        weekend.posting_date = date(2023, 1, 14);

        let entries = vec![
            entry("VT", "1", "411000", "1500", "0"),
            entry("VT", "1", "706000", "0", "1500"),
            evening,
            morning,
            weekend,
            Entry {
                label: "Régularisation".to_string(),
                ..entry("", "9", "471000", "5", "0")
            },
        ];

        let stats = journal_stats(&entries);

        assert_eq!(stats.len(), 2);
        let vt = &stats[0];
        assert_eq!(vt.journal, "VT");
        assert_eq!(vt.name, "Journal VT");
        assert_eq!(vt.entries, 4);
        assert_eq!(vt.balance, Decimal::ZERO);
        assert_eq!(vt.accounts, vec!["411000", "706000"]);
        assert_eq!(vt.evening_count, 1);
        assert_eq!(vt.evening_rate, 0.25);
        // two whole amounts above 1,000
        assert_eq!(vt.anomaly_count, 2);
        assert_eq!(vt.anomaly_rate, 0.5);

        let bq = &stats[1];
        assert_eq!(bq.weekend_count, 1);
        assert_eq!(bq.weekend_rate, 1.0);
    }

    #[test]
    fn test_journal_stats_label_and_amount_count_separately() {
        let entries = vec![Entry {
            label: "Ecriture diverse".to_string(),
            ..entry("OD", "1", "471000", "5000", "0")
        }];

        let stats = journal_stats(&entries);

        assert_eq!(stats[0].anomaly_count, 2);
        assert_eq!(stats[0].anomaly_rate, 2.0);
    }

    #[test]
    fn test_journal_anomalies() {
        let mut weekend = entry("BQ", "4", "512000", "15", "0");
        weekend.posting_date = date(2023, 1, 15);
        let entries = vec![
            entry("VT", "1", "411000", "3000", "0"),
            entry("VT", "1", "706000", "0", "3000"),
            weekend,
            entry("AC", "1", "401000", "10", "0"),
            entry("AC", "1", "607000", "0", "10"),
        ];
        let analysis = analyze(&entries);

        let breakdown = journal_anomalies(&entries, &analysis);

        // BQ: weekend + unbalanced; VT: two round amounts; AC: none
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].journal, "BQ");
        assert_eq!(breakdown[0].unbalanced, 1);
        assert_eq!(breakdown[0].weekend_transactions, 1);
        assert_eq!(breakdown[0].total, 2);
        assert_eq!(breakdown[1].journal, "VT");
        assert_eq!(breakdown[1].round_amounts, 2);
    }

    #[test]
    fn test_period_anomalies_spread_unbalanced() {
        let mut february = entry("VT", "2", "411000", "2000", "0");
        february.posting_date = date(2023, 2, 3);
        let mut march = entry("VT", "3", "411000", "7000", "0");
        march.posting_date = date(2023, 3, 3);
        let entries = vec![entry("VT", "1", "411000", "1000", "0"), february, march];
        let analysis = analyze(&entries);
        assert_eq!(analysis.anomalies.unbalanced_entries.len(), 3);

        let periods = period_anomalies(&analysis);

        let names: Vec<&str> = periods.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(names, vec!["2023-01", "2023-02", "2023-03"]);
        for period in &periods {
            assert_eq!(period.round_amounts, 1);
            assert_eq!(period.unbalanced, 1);
            assert_eq!(period.total, 2);
        }
    }

    #[test]
    fn test_period_anomalies_without_months() {
        let entries = vec![entry("VT", "1", "411000", "12", "0")];
        let analysis = analyze(&entries);

        assert!(period_anomalies(&analysis).is_empty());
    }

    #[test]
    fn test_account_stats() {
        let mut entries: Vec<Entry> = (0..6)
            .map(|i| entry("VT", &i.to_string(), "411000", "2000", "0"))
            .collect();
        entries.extend((0..6).map(|i| entry("VT", &i.to_string(), "706000", "0", "10.50")));
        entries.extend((0..5).map(|i| entry("VT", &i.to_string(), "445710", "0", "99")));

        let stats = account_stats(&entries);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].account, "411000");
        assert_eq!(stats[0].amount, dec("12000"));
        assert_eq!(stats[0].anomaly_ratio, 1.0);
        assert_eq!(stats[1].account, "706000");
        assert_eq!(stats[1].balance, dec("-63"));
        assert_eq!(stats[1].anomaly_ratio, 0.0);
    }

    #[test]
    fn test_activity_profile() {
        let mut undated = labelled("Sans date", "471000", "1");
        undated.posting_date = None;
        let mut sunday = labelled("Dimanche", "471000", "1");
        sunday.posting_date = date(2023, 12, 31);
        let entries = vec![labelled("Mardi", "471000", "1"), sunday, undated];

        let profile = activity_profile(&entries);

        assert_eq!(profile.by_month[0], 1);
        assert_eq!(profile.by_month[11], 1);
        assert_eq!(profile.by_weekday[1], 1);
        assert_eq!(profile.by_weekday[6], 1);
        assert_eq!(profile.by_month.iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_aggregate_exposes_risk() {
        let entries = vec![entry("VT", "1", "411000", "10", "0")];
        let analysis = analyze(&entries);

        let analytics = aggregate(&entries, &analysis);

        assert_eq!(analytics.categories.len(), 6);
        assert_eq!(analytics.total_count, 1);
        assert_eq!(analytics.risk_score, 3);
    }
}
