//! Weighted anomaly categories and the global risk score.

use crate::models::{AnalysisResult, AnomalyCategory, Severity};

/// Upper bound of one category's weighted contribution.
const CATEGORY_CAP: u64 = 100;

/// The six scored anomaly categories with their fixed severities.
pub fn anomaly_categories(analysis: &AnalysisResult) -> Vec<AnomalyCategory> {
    let anomalies = &analysis.anomalies;
    let category = |key: &str, label: &str, severity: Severity, count: usize| AnomalyCategory {
        key: key.to_string(),
        label: label.to_string(),
        severity,
        count,
    };

    vec![
        category(
            "balance",
            "Unbalanced entries",
            Severity::High,
            anomalies.unbalanced_entries.len(),
        ),
        category(
            "duplicates",
            "Duplicate entries",
            Severity::High,
            anomalies.duplicate_entries.len(),
        ),
        category(
            "round_amounts",
            "Round amounts",
            Severity::Medium,
            anomalies.round_amounts.len(),
        ),
        category(
            "weekend_transactions",
            "Weekend transactions",
            Severity::Low,
            anomalies.weekend_transactions.len(),
        ),
        category(
            "sequence_gaps",
            "Sequence gaps",
            Severity::Medium,
            anomalies.sequence_gaps.len(),
        ),
        category(
            "unusual_timing",
            "Unusual posting times",
            Severity::Low,
            anomalies.unusual_transaction_times.len(),
        ),
    ]
}

/// Score between 0 and 100.
///
/// Each category contributes `count x weight`, capped at 100; the sum is
/// normalized by ten times the total weight.
pub fn calculate_risk_score(categories: &[AnomalyCategory]) -> u8 {
    let total_weight: u64 = categories.iter().map(|c| u64::from(c.severity.weight())).sum();
    if total_weight == 0 {
        return 0;
    }

    let weighted: u64 = categories
        .iter()
        .map(|c| (c.count as u64).saturating_mul(u64::from(c.severity.weight())).min(CATEGORY_CAP))
        .sum();

    let score = (100.0 * weighted as f64 / (10 * total_weight) as f64).round();
    score.min(100.0) as u8
}

/// Short reading of a risk level for the report header.
pub fn risk_explanation(level: Severity, anomaly_count: usize) -> String {
    match level {
        Severity::High => format!(
            "High risk: {} anomalies were detected. A thorough review is strongly recommended.",
            anomaly_count
        ),
        Severity::Medium => format!(
            "Medium risk: {} anomalies were detected. A targeted review of the findings is recommended.",
            anomaly_count
        ),
        Severity::Low => format!(
            "Low risk: {} anomalies were detected. The ledger looks consistent overall.",
            anomaly_count
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::detectors::fixtures::entry;

    fn categories_with(counts: [usize; 6]) -> Vec<AnomalyCategory> {
        let mut categories = anomaly_categories(&analyze(&[]));
        for (category, count) in categories.iter_mut().zip(counts) {
            category.count = count;
        }
        categories
    }

    #[test]
    fn test_category_layout() {
        let categories = anomaly_categories(&analyze(&[]));

        let keys: Vec<&str> = categories.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "balance",
                "duplicates",
                "round_amounts",
                "weekend_transactions",
                "sequence_gaps",
                "unusual_timing"
            ]
        );
        let total_weight: u32 = categories.iter().map(|c| c.severity.weight()).sum();
        assert_eq!(total_weight, 34);
    }

    #[test]
    fn test_no_findings_scores_zero() {
        assert_eq!(calculate_risk_score(&categories_with([0; 6])), 0);
    }

    #[test]
    fn test_score_rounding() {
        // 3 unbalanced: 30 / 340 = 8.8%
        assert_eq!(calculate_risk_score(&categories_with([3, 0, 0, 0, 0, 0])), 9);
        // 1 weekend: 2 / 340 = 0.6%
        assert_eq!(calculate_risk_score(&categories_with([0, 0, 0, 1, 0, 0])), 1);
    }

    #[test]
    fn test_category_contribution_is_capped() {
        let capped = calculate_risk_score(&categories_with([10, 0, 0, 0, 0, 0]));
        let beyond = calculate_risk_score(&categories_with([10_000, 0, 0, 0, 0, 0]));

        assert_eq!(capped, 29);
        assert_eq!(capped, beyond);
    }

    #[test]
    fn test_saturated_ledger_scores_full() {
        // 600 / 340 before clamping
        assert_eq!(calculate_risk_score(&categories_with([usize::MAX; 6])), 100);
    }

    #[test]
    fn test_risk_explanation_mentions_count() {
        let text = risk_explanation(Severity::Medium, 42);
        assert!(text.starts_with("Medium risk"));
        assert!(text.contains("42 anomalies"));
    }

    #[test]
    fn test_categories_follow_analysis() {
        let entries = vec![entry("VT", "1", "411000", "10", "0")];
        let categories = anomaly_categories(&analyze(&entries));

        assert_eq!(categories[0].count, 1);
        assert_eq!(categories[0].severity, Severity::High);
        assert!(categories[1..].iter().all(|c| c.count == 0));
    }
}
