//! Analysis pipeline.
//!
//! `analyze` runs every detector once over the full entry set; `aggregate`
//! turns the resulting findings into journal, account, period and pattern
//! summaries plus the global risk score.

pub mod aggregator;
pub mod patterns;
pub mod risk;

pub use aggregator::aggregate;
pub use risk::{anomaly_categories, calculate_risk_score, risk_explanation};

use crate::detectors;
use crate::models::{AnalysisResult, Anomalies, DateRange, Entry, FraudIndicators, LedgerSummary};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Run every detector over the entry set.
///
/// Pure and total: malformed per-row data narrows detection coverage but
/// never fails the run.
pub fn analyze(entries: &[Entry]) -> AnalysisResult {
    info!("Analyzing {} ledger entries", entries.len());

    let summary = summarize(entries);
    debug!(
        "Totals: debit {}, credit {}",
        summary.total_debit, summary.total_credit
    );

    let anomalies = Anomalies {
        duplicate_entries: detectors::find_duplicate_entries(entries),
        unusual_transaction_times: detectors::find_unusual_transaction_times(entries),
        round_amounts: detectors::find_round_amounts(entries),
        unbalanced_entries: detectors::check_journal_balance(entries),
        sequence_gaps: detectors::find_sequence_gaps(entries),
        weekend_transactions: detectors::find_weekend_transactions(entries),
        benford_law_violations: detectors::check_benford_law(entries),
        end_of_period_adjustments: detectors::find_end_of_period_adjustments(entries),
        unusual_account_activity: detectors::detect_unusual_account_activity(entries),
        identical_amounts: detectors::find_identical_amounts(entries),
    };

    let fraud_indicators = FraudIndicators {
        frequent_adjustments: detectors::detect_frequent_adjustments(entries),
        unusual_journal_entries: detectors::detect_unusual_journal_entries(entries),
        transaction_patterns: detectors::detect_suspicious_patterns(entries),
        accounting_gaps: detectors::find_accounting_gaps(entries),
        threshold_avoidance: detectors::detect_threshold_avoidance(entries),
    };

    AnalysisResult {
        summary,
        anomalies,
        fraud_indicators,
    }
}

/// Totals and date range over every entry, independent of any detector.
pub fn summarize(entries: &[Entry]) -> LedgerSummary {
    let total_debit: Decimal = entries.iter().map(|e| e.debit).sum();
    let total_credit: Decimal = entries.iter().map(|e| e.credit).sum();

    let dates = entries.iter().filter_map(|e| e.posting_date);
    let date_range = DateRange {
        start: dates.clone().min(),
        end: dates.max(),
    };

    LedgerSummary {
        total_entries: entries.len(),
        date_range,
        total_debit,
        total_credit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{date, dec, entry, labelled, time};

    fn sample_ledger() -> Vec<Entry> {
        let mut late = entry("BQ", "3", "512000", "0", "2000");
        late.posting_time = time(23, 45);
        late.posting_date = date(2023, 3, 11);

        let mut undated = entry("AC", "1", "401000", "0", "120.50");
        undated.posting_date = None;

        vec![
            entry("VT", "1", "411000", "1200", "0"),
            entry("VT", "1", "706000", "0", "1200"),
            entry("VT", "2", "411000", "480.20", "0"),
            entry("VT", "2", "706000", "0", "480"),
            entry("VT", "5", "411000", "75", "0"),
            entry("VT", "5", "706000", "0", "75"),
            late,
            undated,
            labelled("Virement vers 512100", "512000", "9700"),
        ]
    }

    #[test]
    fn test_summary_totals_cover_every_entry() {
        let entries = sample_ledger();

        let analysis = analyze(&entries);

        assert_eq!(analysis.summary.total_entries, 9);
        assert_eq!(analysis.summary.total_debit, dec("11455.20"));
        assert_eq!(analysis.summary.total_credit, dec("3875.50"));
        assert_eq!(analysis.summary.date_range.start, date(2023, 1, 10));
        assert_eq!(analysis.summary.date_range.end, date(2023, 3, 11));
    }

    #[test]
    fn test_analyze_populates_detectors() {
        let analysis = analyze(&sample_ledger());

        assert_eq!(analysis.anomalies.unusual_transaction_times.len(), 1);
        assert_eq!(analysis.anomalies.weekend_transactions.len(), 1);
        assert_eq!(analysis.anomalies.round_amounts.len(), 1);
        assert_eq!(analysis.anomalies.sequence_gaps.len(), 1);
        assert_eq!(analysis.fraud_indicators.threshold_avoidance.len(), 1);
        assert_eq!(analysis.fraud_indicators.transaction_patterns.transfers.len(), 1);

        // VT-2 is off by 0.20; BQ-3, AC-1 and OD-1 are one-sided
        let ids: Vec<&str> = analysis
            .anomalies
            .unbalanced_entries
            .iter()
            .map(|u| u.journal_entry_id.as_str())
            .collect();
        assert_eq!(ids, vec!["AC-1", "BQ-3", "OD-1", "VT-2"]);
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let entries = sample_ledger();
        assert_eq!(analyze(&entries), analyze(&entries));
    }

    #[test]
    fn test_oversized_amount_cells_do_not_abort_analysis() {
        let raw = "CompteNum;Debit\n\
                   411000;79228162514264337593543950335\n\
                   411000;79228162514264337593543950335\n\
                   411000;12,50\n";
        let entries =
            crate::ingest::load_reader(raw.as_bytes(), &Default::default()).unwrap();

        let analysis = analyze(&entries);
        let analytics = super::aggregate(&entries, &analysis);

        assert_eq!(analysis.summary.total_entries, 3);
        assert_eq!(analysis.summary.total_debit, dec("12.50"));
        assert!(analytics.risk_score <= 100);
    }

    #[test]
    fn test_analyze_empty_ledger() {
        let analysis = analyze(&[]);

        assert_eq!(analysis.summary.total_entries, 0);
        assert_eq!(analysis.summary.total_debit, Decimal::ZERO);
        assert_eq!(analysis.summary.date_range, DateRange::default());
        assert!(!analysis.anomalies.benford_law_violations.significant_deviation);
    }
}
