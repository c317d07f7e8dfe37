//! Anomaly and fraud-indicator detectors.
//!
//! Every detector is a pure function over the full entry sequence. None of
//! them depends on another; malformed per-row data only narrows what a
//! detector can see, it never aborts the run.

pub mod accounts;
pub mod adjustments;
pub mod amounts;
pub mod balance;
pub mod benford;
pub mod circuits;
pub mod duplicates;
pub mod sequence;
pub mod timing;

pub use accounts::{detect_unusual_account_activity, find_accounting_gaps};
pub use adjustments::{
    detect_frequent_adjustments, detect_unusual_journal_entries, find_end_of_period_adjustments,
};
pub use amounts::{detect_threshold_avoidance, find_identical_amounts, find_round_amounts};
pub use balance::check_journal_balance;
pub use benford::check_benford_law;
pub use circuits::detect_suspicious_patterns;
pub use duplicates::find_duplicate_entries;
pub use sequence::find_sequence_gaps;
pub use timing::{find_unusual_transaction_times, find_weekend_transactions};

/// Label fragments marking an adjustment, correction or regularization.
pub const ADJUSTMENT_KEYWORDS: &[&str] = &[
    "ajustement",
    "ajust",
    "correction",
    "régularisation",
    "regularisation",
    "adjustment",
];

/// Label fragments that make a large entry worth a second look.
pub const SUSPICIOUS_TERMS: &[&str] = &[
    "divers",
    "other",
    "misc",
    "adjustment",
    "ajustement",
    "special",
    "temporary",
    "pending",
    "error",
];

/// Returns true when a lowercased label names an adjustment.
pub fn is_adjustment_label(label: &str) -> bool {
    ADJUSTMENT_KEYWORDS.iter().any(|kw| label.contains(kw))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::Entry;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;

    pub fn dec(value: &str) -> Decimal {
        value.parse().expect("valid decimal literal")
    }

    pub fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    pub fn time(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    /// A dated entry line with the fields most detectors look at.
    pub fn entry(journal: &str, number: &str, account: &str, debit: &str, credit: &str) -> Entry {
        Entry {
            journal_code: journal.to_string(),
            journal_label: format!("Journal {}", journal),
            account: account.to_string(),
            entry_number: number.to_string(),
            piece_ref: format!("P{}", number),
            label: "Facture client".to_string(),
            debit: dec(debit),
            credit: dec(credit),
            posting_date: date(2023, 1, 10),
            posting_time: None,
        }
    }

    pub fn labelled(label: &str, account: &str, debit: &str) -> Entry {
        Entry {
            label: label.to_string(),
            ..entry("OD", "1", account, debit, "0")
        }
    }
}
