//! Audit report assembly and rendering.
//!
//! An [`AuditReport`] bundles the detector findings, the aggregated view and
//! the derived critical anomalies and recommendations. The generator renders
//! it as Markdown or JSON.

pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report, write_report};

use crate::analysis::risk_explanation;
use crate::models::{AnalysisResult, AnalyticsResult, Severity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DUPLICATE_ALERT_MIN: usize = 5;
const DUPLICATE_ALERT_HIGH: usize = 20;
const ROUND_AMOUNT_RECOMMENDATION_MIN: usize = 5;

/// Metadata about one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Ledger file that was analyzed
    pub source_file: String,
    /// When the analysis was performed
    pub analysis_date: DateTime<Utc>,
    /// Number of ledger entries analyzed
    pub total_entries: usize,
    /// Analysis duration in seconds
    pub duration_seconds: f64,
    /// Risk score between 0 and 100
    pub risk_score: u8,
    pub risk_level: Severity,
    pub risk_explanation: String,
}

/// A headline finding shown at the top of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalAnomaly {
    pub kind: String,
    pub detail: String,
    pub severity: Severity,
}

/// An audit action derived from the findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub steps: Vec<String>,
}

/// Complete audit report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub metadata: ReportMetadata,
    pub analysis: AnalysisResult,
    pub analytics: AnalyticsResult,
    pub critical_anomalies: Vec<CriticalAnomaly>,
    pub recommendations: Vec<Recommendation>,
}

impl AuditReport {
    /// Assemble a report from one analysis run.
    pub fn new(
        source_file: impl Into<String>,
        analysis: AnalysisResult,
        analytics: AnalyticsResult,
        duration_seconds: f64,
    ) -> Self {
        let risk_level = analytics.risk_level();
        let metadata = ReportMetadata {
            source_file: source_file.into(),
            analysis_date: Utc::now(),
            total_entries: analysis.summary.total_entries,
            duration_seconds,
            risk_score: analytics.risk_score,
            risk_level,
            risk_explanation: risk_explanation(risk_level, analytics.total_count),
        };

        Self {
            critical_anomalies: critical_anomalies(&analysis),
            recommendations: recommendations(&analysis),
            metadata,
            analysis,
            analytics,
        }
    }
}

fn imbalance_alert(analysis: &AnalysisResult) -> Option<Decimal> {
    let imbalance = analysis.summary.imbalance();
    (imbalance > Decimal::new(1, 2)).then_some(imbalance)
}

/// Headline findings, most structural first.
pub fn critical_anomalies(analysis: &AnalysisResult) -> Vec<CriticalAnomaly> {
    let anomalies = &analysis.anomalies;
    let mut critical = Vec::new();

    if let Some(imbalance) = imbalance_alert(analysis) {
        critical.push(CriticalAnomaly {
            kind: "Balance".to_string(),
            detail: format!("Debit/credit difference of {:.2} €", imbalance),
            severity: Severity::High,
        });
    }

    if !anomalies.unbalanced_entries.is_empty() {
        critical.push(CriticalAnomaly {
            kind: "Unbalanced entries".to_string(),
            detail: format!("{} unbalanced entries", anomalies.unbalanced_entries.len()),
            severity: Severity::High,
        });
    }

    if !anomalies.sequence_gaps.is_empty() {
        critical.push(CriticalAnomaly {
            kind: "Sequence".to_string(),
            detail: format!("{} numbering gaps", anomalies.sequence_gaps.len()),
            severity: Severity::Medium,
        });
    }

    if anomalies.benford_law_violations.significant_deviation {
        critical.push(CriticalAnomaly {
            kind: "Benford".to_string(),
            detail: "Significant deviation from Benford's law".to_string(),
            severity: Severity::Medium,
        });
    }

    let duplicates = anomalies.duplicate_entries.len();
    if duplicates > DUPLICATE_ALERT_MIN {
        critical.push(CriticalAnomaly {
            kind: "Duplicates".to_string(),
            detail: format!("{} potentially duplicated entries", duplicates),
            severity: if duplicates > DUPLICATE_ALERT_HIGH {
                Severity::High
            } else {
                Severity::Medium
            },
        });
    }

    critical
}

fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Audit actions matching the findings, with a general review when nothing
/// specific applies.
pub fn recommendations(analysis: &AnalysisResult) -> Vec<Recommendation> {
    let anomalies = &analysis.anomalies;
    let mut recs = Vec::new();

    if let Some(imbalance) = imbalance_alert(analysis) {
        recs.push(Recommendation {
            title: "Review unbalanced postings".to_string(),
            description: format!(
                "The trial balance is off by {:.2} € between total debits and credits.",
                imbalance
            ),
            steps: steps(&[
                "Check period-closing entries",
                "Review recent adjustment entries",
                "Reconcile subsidiary ledgers with the general ledger",
            ]),
        });
    }

    if !anomalies.duplicate_entries.is_empty() {
        recs.push(Recommendation {
            title: "Examine potential duplicate entries".to_string(),
            description: format!(
                "{} entries share account, date, document and amounts with an earlier entry.",
                anomalies.duplicate_entries.len()
            ),
            steps: steps(&[
                "Determine whether duplicates come from keying errors or repeated imports",
                "Review the invoice recording process",
                "Check interfaces between systems where applicable",
            ]),
        });
    }

    if anomalies.round_amounts.len() > ROUND_AMOUNT_RECOMMENDATION_MIN {
        recs.push(Recommendation {
            title: "Examine round-amount transactions".to_string(),
            description: format!(
                "{} transactions carry round amounts, which may indicate estimates.",
                anomalies.round_amounts.len()
            ),
            steps: steps(&[
                "Request supporting documents for the largest amounts",
                "Verify the calculation basis of these amounts",
                "Confirm that they match real transactions",
            ]),
        });
    }

    if !anomalies.weekend_transactions.is_empty() {
        recs.push(Recommendation {
            title: "Check weekend postings".to_string(),
            description: format!(
                "{} transactions were posted on a weekend.",
                anomalies.weekend_transactions.len()
            ),
            steps: steps(&[
                "Determine whether these postings are automated or manual",
                "Identify the users who recorded them",
                "Confirm they are justified by actual business activity",
            ]),
        });
    }

    if !anomalies.sequence_gaps.is_empty() {
        let missing = anomalies
            .sequence_gaps
            .iter()
            .fold(0i64, |total, g| total.saturating_add(g.missing));
        let mut description = format!(
            "{} gaps in entry numbering ({} missing numbers).",
            anomalies.sequence_gaps.len(),
            missing
        );
        if let Some(journal) = most_gapped_journal(analysis) {
            description.push_str(&format!(" Most affected journal: {}.", journal));
        }
        recs.push(Recommendation {
            title: "Investigate numbering gaps".to_string(),
            description,
            steps: steps(&[
                "Check whether entries or documents were deleted",
                "Review the affected journals for manipulation",
                "Check authorizations for cancelling entries in the accounting system",
            ]),
        });
    }

    if recs.is_empty() {
        recs.push(Recommendation {
            title: "General consistency review".to_string(),
            description: "No major anomaly was detected; a general review is still advised."
                .to_string(),
            steps: steps(&[
                "Sample-test the most significant entries",
                "Check balances of the main accounts",
                "Review documentation for unusual transactions",
            ]),
        });
    }

    recs
}

/// Journal with the most missing entry numbers.
fn most_gapped_journal(analysis: &AnalysisResult) -> Option<&str> {
    let mut missing: BTreeMap<&str, i64> = BTreeMap::new();
    for gap in &analysis.anomalies.sequence_gaps {
        let total = missing.entry(gap.journal.as_str()).or_default();
        *total = total.saturating_add(gap.missing);
    }
    missing
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(journal, _)| journal)
}
