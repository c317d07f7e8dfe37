//! Data models for the ledger analyzer.
//!
//! This module contains the canonical ledger entry produced by the row
//! normalizer, the typed findings emitted by each detector, and the
//! aggregated views built on top of them.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level of an anomaly category or of a whole analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low severity - unusual but common in healthy ledgers
    Low,
    /// Medium severity - worth a targeted review
    Medium,
    /// High severity - structural accounting defects
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
        }
    }
}

impl Severity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟢",
            Severity::Medium => "🟡",
            Severity::High => "🔴",
        }
    }

    /// Weight of a category of this severity in the risk score.
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Low => 2,
            Severity::Medium => 5,
            Severity::High => 10,
        }
    }

    /// Map a 0-100 risk score onto a severity level.
    pub fn from_risk_score(score: u8) -> Self {
        match score {
            60.. => Severity::High,
            30..=59 => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

/// One accounting-entry line of a FEC export, after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Journal code (e.g. `VT`, `AC`, `BQ`).
    pub journal_code: String,
    /// Human-readable journal name.
    pub journal_label: String,
    /// Account number (`CompteNum`).
    pub account: String,
    /// Entry number within the journal (`EcritureNum`).
    pub entry_number: String,
    /// External document reference (`PieceRef`).
    pub piece_ref: String,
    /// Free-text entry label (`EcritureLib`).
    pub label: String,
    /// Debit amount, never negative.
    pub debit: Decimal,
    /// Credit amount, never negative.
    pub credit: Decimal,
    /// Posting date, absent when missing or unparseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_date: Option<NaiveDate>,
    /// Posting time, absent when the export carries none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_time: Option<NaiveTime>,
}

impl Entry {
    /// The entry's primary amount: the debit when nonzero, else the credit.
    pub fn amount(&self) -> Decimal {
        if self.debit.is_zero() {
            self.credit
        } else {
            self.debit
        }
    }

    /// Lowercased label, used by every keyword heuristic.
    pub fn label_lowercase(&self) -> String {
        self.label.to_lowercase()
    }

    /// Hour of the posting time, if known.
    pub fn posting_hour(&self) -> Option<u32> {
        self.posting_time.map(|t| t.hour())
    }

    /// `YYYY-MM` period of the posting date, if known.
    pub fn period(&self) -> Option<String> {
        self.posting_date
            .map(|d| format!("{:04}-{:02}", d.year(), d.month()))
    }
}

/// First and last posting dates of the data set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Global totals, computed over every entry regardless of findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_entries: usize,
    pub date_range: DateRange,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

impl LedgerSummary {
    /// Absolute difference between total debit and total credit.
    pub fn imbalance(&self) -> Decimal {
        (self.total_debit - self.total_credit).abs()
    }
}

/// An entry flagged by a single-entry detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedEntry {
    /// Position of the entry in the input sequence.
    pub index: usize,
    pub entry: Entry,
}

/// A later entry matching an earlier one under a different entry number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateEntry {
    pub index: usize,
    /// Index of the first occurrence of the matching key.
    pub first_index: usize,
    pub entry: Entry,
}

/// A `(journal, entry number)` group whose debits and credits differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbalancedEntry {
    pub journal_entry_id: String,
    pub journal: String,
    pub entry_number: String,
    pub diff: Decimal,
    pub entries: Vec<Entry>,
}

/// A hole in the numbering of one journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceGap {
    pub journal: String,
    pub from: i64,
    pub to: i64,
    pub missing: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenfordDeviation {
    pub digit: u8,
    pub expected: f64,
    pub observed: f64,
    pub deviation: f64,
}

/// First-digit test against Benford's distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenfordAnalysis {
    /// Number of amounts that took part in the test.
    pub sample_size: usize,
    pub deviations: Vec<BenfordDeviation>,
    /// Observed frequency of leading digits 1 through 9.
    pub first_digit_distribution: [f64; 9],
    pub significant_deviation: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndOfPeriodAdjustments {
    pub month_end: Vec<FlaggedEntry>,
    pub quarter_end: Vec<FlaggedEntry>,
    pub year_end: Vec<FlaggedEntry>,
}

impl EndOfPeriodAdjustments {
    pub fn len(&self) -> usize {
        self.month_end.len() + self.quarter_end.len() + self.year_end.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why an account's activity stood out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnusualAccountActivity {
    /// Few transactions carrying large totals.
    LowVolumeHighValue {
        account: String,
        transactions: usize,
        total_amount: Decimal,
    },
    /// Debit and credit totals far apart, both absolutely and relatively.
    SignificantImbalance {
        account: String,
        balance: Decimal,
        ratio: Decimal,
    },
}

impl UnusualAccountActivity {
    pub fn account(&self) -> &str {
        match self {
            UnusualAccountActivity::LowVolumeHighValue { account, .. }
            | UnusualAccountActivity::SignificantImbalance { account, .. } => account,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            UnusualAccountActivity::LowVolumeHighValue { .. } => "Low volume, high value",
            UnusualAccountActivity::SignificantImbalance { .. } => "Significant imbalance",
        }
    }
}

/// A large amount recurring across several accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdenticalAmount {
    pub amount: Decimal,
    pub occurrences: usize,
    pub unique_accounts: Vec<String>,
    /// At most ten example entries.
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequentAdjustment {
    pub account: String,
    pub count: usize,
}

/// Transfer-like entries and the closed account circuits inferred from them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPatterns {
    /// First twenty transfer-like entries.
    pub transfers: Vec<FlaggedEntry>,
    /// Account paths that return to their start, at most ten.
    pub suspicious_circuits: Vec<Vec<String>>,
}

/// Two consecutive used accounts of one class with a suspicious gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingGap {
    pub class: String,
    pub from: String,
    pub to: String,
    pub gap: u64,
}

/// An amount just under an authorization threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdAvoidance {
    pub index: usize,
    pub entry: Entry,
    pub amount: Decimal,
    pub threshold: Decimal,
    pub percent_below_threshold: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomalies {
    pub duplicate_entries: Vec<DuplicateEntry>,
    pub unusual_transaction_times: Vec<FlaggedEntry>,
    pub round_amounts: Vec<FlaggedEntry>,
    pub unbalanced_entries: Vec<UnbalancedEntry>,
    pub sequence_gaps: Vec<SequenceGap>,
    pub weekend_transactions: Vec<FlaggedEntry>,
    pub benford_law_violations: BenfordAnalysis,
    pub end_of_period_adjustments: EndOfPeriodAdjustments,
    pub unusual_account_activity: Vec<UnusualAccountActivity>,
    pub identical_amounts: Vec<IdenticalAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudIndicators {
    pub frequent_adjustments: Vec<FrequentAdjustment>,
    pub unusual_journal_entries: Vec<FlaggedEntry>,
    pub transaction_patterns: TransactionPatterns,
    pub accounting_gaps: Vec<AccountingGap>,
    pub threshold_avoidance: Vec<ThresholdAvoidance>,
}

/// Output of a single detector pass over a data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: LedgerSummary,
    pub anomalies: Anomalies,
    pub fraud_indicators: FraudIndicators,
}

/// Per-journal volume and heuristic statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalStats {
    pub journal: String,
    pub name: String,
    pub entries: usize,
    pub debit: Decimal,
    pub credit: Decimal,
    pub balance: Decimal,
    pub account_count: usize,
    /// First five accounts used by the journal.
    pub accounts: Vec<String>,
    pub weekend_count: usize,
    pub evening_count: usize,
    pub anomaly_count: usize,
    pub weekend_rate: f64,
    pub evening_rate: f64,
    pub anomaly_rate: f64,
}

/// Detector finding counts attributed to one journal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalAnomalies {
    pub journal: String,
    pub name: String,
    pub duplicates: usize,
    pub unbalanced: usize,
    pub round_amounts: usize,
    pub weekend_transactions: usize,
    pub sequence_gaps: usize,
    pub unusual_timing: usize,
    pub total: usize,
}

/// Detector finding counts attributed to one `YYYY-MM` month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAnomalies {
    pub period: String,
    pub duplicates: usize,
    pub unbalanced: usize,
    pub round_amounts: usize,
    pub weekend_transactions: usize,
    pub unusual_timing: usize,
    pub total: usize,
}

/// Volume statistics of one busy account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStats {
    pub account: String,
    pub transactions: usize,
    pub amount: Decimal,
    pub balance: Decimal,
    pub anomaly_ratio: f64,
}

/// Dated-entry counts by month of year and by weekday (Monday first).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityProfile {
    pub by_month: [usize; 12],
    pub by_weekday: [usize; 7],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequentAmount {
    pub amount: Decimal,
    pub count: usize,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitPattern {
    pub pattern: String,
    pub count: usize,
    pub examples: Vec<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountPatterns {
    pub frequent_amounts: Vec<FrequentAmount>,
    pub patterns: Vec<DigitPattern>,
}

/// One of the six weighted anomaly categories of the risk score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyCategory {
    pub key: String,
    pub label: String,
    pub severity: Severity,
    pub count: usize,
}

/// Aggregated, read-only view over one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResult {
    pub journals: Vec<JournalStats>,
    pub accounts: Vec<AccountStats>,
    pub activity: ActivityProfile,
    pub journal_anomalies: Vec<JournalAnomalies>,
    pub periods: Vec<PeriodAnomalies>,
    pub amount_patterns: AmountPatterns,
    pub categories: Vec<AnomalyCategory>,
    pub total_count: usize,
    pub risk_score: u8,
}

impl AnalyticsResult {
    /// Severity level corresponding to the risk score.
    pub fn risk_level(&self) -> Severity {
        Severity::from_risk_score(self.risk_score)
    }
}
