//! Markdown and JSON report generation.
//!
//! The Markdown report is built section by section; every detector section
//! lists at most `max_examples` findings.

use super::{AuditReport, CriticalAnomaly, Recommendation, ReportMetadata};
use crate::detectors::benford::BENFORD_EXPECTED;
use crate::models::{
    AnalysisResult, AnalyticsResult, Entry, FlaggedEntry, LedgerSummary, UnusualAccountActivity,
};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AuditReport, max_examples: usize) -> String {
    let mut output = String::new();

    output.push_str("# FEC Audit Report\n\n");

    output.push_str(&generate_metadata_section(
        &report.metadata,
        &report.analysis.summary,
    ));
    output.push_str(&generate_table_of_contents());
    output.push_str(&generate_risk_section(&report.metadata));
    output.push_str(&generate_critical_section(&report.critical_anomalies));
    output.push_str(&generate_summary_section(&report.analytics));
    output.push_str(&generate_journals_section(&report.analytics));
    output.push_str(&generate_periods_section(&report.analytics));
    output.push_str(&generate_findings_section(&report.analysis, max_examples));
    output.push_str(&generate_fraud_section(&report.analysis, max_examples));
    output.push_str(&generate_benford_section(&report.analysis));
    output.push_str(&generate_patterns_section(&report.analytics));
    output.push_str(&generate_recommendations_section(&report.recommendations));
    output.push_str(&generate_footer());

    output
}

/// Escape a free-text cell for a Markdown table.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn entry_table_header() -> &'static str {
    "| Date | Journal | Entry | Account | Label | Debit | Credit |\n|:---|:---:|:---:|:---|:---|---:|---:|\n"
}

fn entry_row(entry: &Entry) -> String {
    format!(
        "| {} | {} | {} | {} | {} | {} | {} |\n",
        entry
            .posting_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string()),
        cell(&entry.journal_code),
        cell(&entry.entry_number),
        cell(&entry.account),
        cell(&entry.label),
        entry.debit,
        entry.credit
    )
}

/// Subsection listing flagged entries, omitted when there are none.
fn flagged_entries_block(title: &str, flagged: &[FlaggedEntry], max_examples: usize) -> String {
    if flagged.is_empty() {
        return String::new();
    }

    let mut block = format!("### {} ({})\n\n", title, flagged.len());
    block.push_str(entry_table_header());
    for item in flagged.iter().take(max_examples) {
        block.push_str(&entry_row(&item.entry));
    }
    block.push_str(&more_line(flagged.len(), max_examples));
    block.push('\n');
    block
}

fn more_line(total: usize, shown: usize) -> String {
    if total > shown {
        format!("\n*... and {} more*\n", total - shown)
    } else {
        String::new()
    }
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata, summary: &LedgerSummary) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source File:** `{}`\n", metadata.source_file));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Entries Analyzed:** {}\n", metadata.total_entries));
    match (summary.date_range.start, summary.date_range.end) {
        (Some(start), Some(end)) => section.push_str(&format!(
            "- **Period:** {} to {}\n",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        )),
        _ => section.push_str("- **Period:** no dated entries\n"),
    }
    section.push_str(&format!("- **Total Debit:** {:.2}\n", summary.total_debit));
    section.push_str(&format!("- **Total Credit:** {:.2}\n", summary.total_credit));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents() -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    for (title, anchor) in [
        ("Metadata", "metadata"),
        ("Risk Assessment", "risk-assessment"),
        ("Critical Anomalies", "critical-anomalies"),
        ("Summary", "summary"),
        ("Journals", "journals"),
        ("Periods", "periods"),
        ("Detailed Findings", "detailed-findings"),
        ("Fraud Indicators", "fraud-indicators"),
        ("Benford Analysis", "benford-analysis"),
        ("Amount Patterns", "amount-patterns"),
        ("Recommendations", "recommendations"),
    ] {
        toc.push_str(&format!("- [{}](#{})\n", title, anchor));
    }
    toc.push('\n');

    toc
}

fn generate_risk_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Risk Assessment\n\n");
    section.push_str(&format!(
        "**Risk Score:** {}/100 | **Level:** {} {}\n\n",
        metadata.risk_score,
        metadata.risk_level.emoji(),
        metadata.risk_level
    ));
    section.push_str(&format!("> {}\n\n", metadata.risk_explanation));

    section
}

fn generate_critical_section(critical: &[CriticalAnomaly]) -> String {
    let mut section = String::new();

    section.push_str("## Critical Anomalies\n\n");
    if critical.is_empty() {
        section.push_str("No critical anomaly was detected. ✅\n\n");
        return section;
    }

    for anomaly in critical {
        section.push_str(&format!(
            "- {} **{}**: {}\n",
            anomaly.severity.emoji(),
            anomaly.kind,
            anomaly.detail
        ));
    }
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(analytics: &AnalyticsResult) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    section.push_str("### Anomaly Categories\n\n");
    section.push_str("| Category | Severity | Count |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for category in &analytics.categories {
        section.push_str(&format!(
            "| {} | {} {} | {} |\n",
            category.label,
            category.severity.emoji(),
            category.severity,
            category.count
        ));
    }
    section.push_str(&format!("| **Total** | | **{}** |\n\n", analytics.total_count));

    if !analytics.accounts.is_empty() {
        section.push_str("### Busiest Accounts\n\n");
        section.push_str("| Account | Transactions | Volume | Balance | Anomaly Ratio |\n");
        section.push_str("|:---|:---:|---:|---:|:---:|\n");
        for account in &analytics.accounts {
            section.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {:.1}% |\n",
                cell(&account.account),
                account.transactions,
                account.amount,
                account.balance,
                account.anomaly_ratio * 100.0
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_journals_section(analytics: &AnalyticsResult) -> String {
    let mut section = String::new();

    section.push_str("## Journals\n\n");
    if analytics.journals.is_empty() {
        section.push_str("No journal codes found.\n\n");
        return section;
    }

    section.push_str("| Journal | Name | Entries | Debit | Credit | Balance | Accounts | Weekend | Evening | Anomaly Rate |\n");
    section.push_str("|:---|:---|:---:|---:|---:|---:|:---:|:---:|:---:|:---:|\n");
    for journal in &analytics.journals {
        section.push_str(&format!(
            "| {} | {} | {} | {:.2} | {:.2} | {:.2} | {} | {:.1}% | {:.1}% | {:.1}% |\n",
            cell(&journal.journal),
            cell(&journal.name),
            journal.entries,
            journal.debit,
            journal.credit,
            journal.balance,
            journal.account_count,
            journal.weekend_rate * 100.0,
            journal.evening_rate * 100.0,
            journal.anomaly_rate * 100.0
        ));
    }
    section.push('\n');

    if !analytics.journal_anomalies.is_empty() {
        section.push_str("### Findings by Journal\n\n");
        section.push_str("| Journal | Duplicates | Unbalanced | Round | Weekend | Gaps | Timing | **Total** |\n");
        section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");
        for j in &analytics.journal_anomalies {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | **{}** |\n",
                cell(&j.journal),
                j.duplicates,
                j.unbalanced,
                j.round_amounts,
                j.weekend_transactions,
                j.sequence_gaps,
                j.unusual_timing,
                j.total
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_periods_section(analytics: &AnalyticsResult) -> String {
    let mut section = String::new();

    section.push_str("## Periods\n\n");
    if analytics.periods.is_empty() {
        section.push_str("No dated findings.\n\n");
    } else {
        section.push_str("| Period | Duplicates | Unbalanced | Round | Weekend | Timing | **Total** |\n");
        section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|:---:|\n");
        for p in &analytics.periods {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | **{}** |\n",
                p.period,
                p.duplicates,
                p.unbalanced,
                p.round_amounts,
                p.weekend_transactions,
                p.unusual_timing,
                p.total
            ));
        }
        section.push('\n');
    }

    let activity = &analytics.activity;
    section.push_str("### Activity by Weekday\n\n");
    section.push_str("| Mon | Tue | Wed | Thu | Fri | Sat | Sun |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    let days: Vec<String> = activity.by_weekday.iter().map(|c| c.to_string()).collect();
    section.push_str(&format!("| {} |\n\n", days.join(" | ")));

    section
}

/// Generate the per-detector findings section.
fn generate_findings_section(analysis: &AnalysisResult, max_examples: usize) -> String {
    let anomalies = &analysis.anomalies;
    let mut section = String::new();

    section.push_str("## Detailed Findings\n\n");

    if !anomalies.unbalanced_entries.is_empty() {
        section.push_str(&format!(
            "### Unbalanced Entries ({})\n\n",
            anomalies.unbalanced_entries.len()
        ));
        section.push_str("| Entry | Lines | Difference |\n|:---|:---:|---:|\n");
        for u in anomalies.unbalanced_entries.iter().take(max_examples) {
            section.push_str(&format!(
                "| {} | {} | {:.2} |\n",
                cell(&u.journal_entry_id),
                u.entries.len(),
                u.diff
            ));
        }
        section.push_str(&more_line(anomalies.unbalanced_entries.len(), max_examples));
        section.push('\n');
    }

    if !anomalies.duplicate_entries.is_empty() {
        section.push_str(&format!(
            "### Duplicate Entries ({})\n\n",
            anomalies.duplicate_entries.len()
        ));
        section.push_str(entry_table_header());
        for d in anomalies.duplicate_entries.iter().take(max_examples) {
            section.push_str(&entry_row(&d.entry));
        }
        section.push_str(&more_line(anomalies.duplicate_entries.len(), max_examples));
        section.push('\n');
    }

    if !anomalies.sequence_gaps.is_empty() {
        section.push_str(&format!(
            "### Sequence Gaps ({})\n\n",
            anomalies.sequence_gaps.len()
        ));
        section.push_str("| Journal | From | To | Missing |\n|:---|:---:|:---:|:---:|\n");
        for g in anomalies.sequence_gaps.iter().take(max_examples) {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                cell(&g.journal),
                g.from,
                g.to,
                g.missing
            ));
        }
        section.push_str(&more_line(anomalies.sequence_gaps.len(), max_examples));
        section.push('\n');
    }

    section.push_str(&flagged_entries_block(
        "Round Amounts",
        &anomalies.round_amounts,
        max_examples,
    ));
    section.push_str(&flagged_entries_block(
        "Weekend Transactions",
        &anomalies.weekend_transactions,
        max_examples,
    ));
    section.push_str(&flagged_entries_block(
        "Unusual Posting Times",
        &anomalies.unusual_transaction_times,
        max_examples,
    ));

    let period_end = &anomalies.end_of_period_adjustments;
    section.push_str(&flagged_entries_block(
        "Year-End Adjustments",
        &period_end.year_end,
        max_examples,
    ));
    section.push_str(&flagged_entries_block(
        "Quarter-End Adjustments",
        &period_end.quarter_end,
        max_examples,
    ));
    section.push_str(&flagged_entries_block(
        "Month-End Adjustments",
        &period_end.month_end,
        max_examples,
    ));

    if !anomalies.unusual_account_activity.is_empty() {
        section.push_str(&format!(
            "### Unusual Account Activity ({})\n\n",
            anomalies.unusual_account_activity.len()
        ));
        section.push_str("| Account | Reason | Detail |\n|:---|:---|:---|\n");
        for activity in anomalies.unusual_account_activity.iter().take(max_examples) {
            let detail = match activity {
                UnusualAccountActivity::LowVolumeHighValue {
                    transactions,
                    total_amount,
                    ..
                } => format!("{} transactions totalling {:.2}", transactions, total_amount),
                UnusualAccountActivity::SignificantImbalance { balance, ratio, .. } => {
                    format!("balance {:.2} ({:.1}% of volume)", balance, ratio * Decimal::ONE_HUNDRED)
                }
            };
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                cell(activity.account()),
                activity.reason(),
                detail
            ));
        }
        section.push_str(&more_line(anomalies.unusual_account_activity.len(), max_examples));
        section.push('\n');
    }

    if !anomalies.identical_amounts.is_empty() {
        section.push_str(&format!(
            "### Identical Amounts ({})\n\n",
            anomalies.identical_amounts.len()
        ));
        section.push_str("| Amount | Occurrences | Accounts |\n|:---|:---:|:---|\n");
        for identical in anomalies.identical_amounts.iter().take(max_examples) {
            section.push_str(&format!(
                "| {:.2} | {} | {} |\n",
                identical.amount,
                identical.occurrences,
                cell(&identical.unique_accounts.join(", "))
            ));
        }
        section.push_str(&more_line(anomalies.identical_amounts.len(), max_examples));
        section.push('\n');
    }

    section
}

fn generate_fraud_section(analysis: &AnalysisResult, max_examples: usize) -> String {
    let indicators = &analysis.fraud_indicators;
    let mut section = String::new();

    section.push_str("## Fraud Indicators\n\n");

    if !indicators.frequent_adjustments.is_empty() {
        section.push_str("### Frequently Adjusted Accounts\n\n");
        section.push_str("| Account | Adjustments |\n|:---|:---:|\n");
        for f in indicators.frequent_adjustments.iter().take(max_examples) {
            section.push_str(&format!("| {} | {} |\n", cell(&f.account), f.count));
        }
        section.push('\n');
    }

    section.push_str(&flagged_entries_block(
        "Large Entries with Vague Labels",
        &indicators.unusual_journal_entries,
        max_examples,
    ));

    if !indicators.threshold_avoidance.is_empty() {
        section.push_str(&format!(
            "### Amounts Just Below Thresholds ({})\n\n",
            indicators.threshold_avoidance.len()
        ));
        section.push_str("| Account | Amount | Threshold | Below By |\n|:---|---:|---:|:---:|\n");
        for t in indicators.threshold_avoidance.iter().take(max_examples) {
            section.push_str(&format!(
                "| {} | {:.2} | {} | {}% |\n",
                cell(&t.entry.account),
                t.amount,
                t.threshold,
                t.percent_below_threshold
            ));
        }
        section.push_str(&more_line(indicators.threshold_avoidance.len(), max_examples));
        section.push('\n');
    }

    if !indicators.accounting_gaps.is_empty() {
        section.push_str("### Gaps in Used Accounts\n\n");
        section.push_str("| Class | From | To | Gap |\n|:---:|:---|:---|:---:|\n");
        for g in indicators.accounting_gaps.iter().take(max_examples) {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                g.class,
                cell(&g.from),
                cell(&g.to),
                g.gap
            ));
        }
        section.push('\n');
    }

    let patterns = &indicators.transaction_patterns;
    section.push_str(&flagged_entries_block(
        "Transfers",
        &patterns.transfers,
        max_examples,
    ));
    if !patterns.suspicious_circuits.is_empty() {
        section.push_str("### Circular Fund Movements\n\n");
        for circuit in &patterns.suspicious_circuits {
            section.push_str(&format!("- `{}`\n", circuit.join(" → ")));
        }
        section.push('\n');
    }

    section
}

fn generate_benford_section(analysis: &AnalysisResult) -> String {
    let benford = &analysis.anomalies.benford_law_violations;
    let mut section = String::new();

    section.push_str("## Benford Analysis\n\n");
    section.push_str(&format!("Sample size: {} amounts. ", benford.sample_size));
    if benford.significant_deviation {
        section.push_str("⚠️ The leading-digit distribution deviates significantly.\n\n");
    } else {
        section.push_str("No significant deviation.\n\n");
    }

    section.push_str("| Digit | Expected | Observed | Deviation |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    for (i, (expected, observed)) in BENFORD_EXPECTED
        .iter()
        .zip(benford.first_digit_distribution.iter())
        .enumerate()
    {
        let flagged = benford.deviations.iter().any(|d| usize::from(d.digit) == i + 1);
        section.push_str(&format!(
            "| {} | {:.1}% | {:.1}% | {}{:.1}% |\n",
            i + 1,
            expected * 100.0,
            observed * 100.0,
            if flagged { "⚠️ " } else { "" },
            (observed - expected).abs() * 100.0
        ));
    }
    section.push('\n');

    section
}

fn generate_patterns_section(analytics: &AnalyticsResult) -> String {
    let patterns = &analytics.amount_patterns;
    let mut section = String::new();

    section.push_str("## Amount Patterns\n\n");
    if patterns.frequent_amounts.is_empty() && patterns.patterns.is_empty() {
        section.push_str("No recurring amount or digit pattern.\n\n");
        return section;
    }

    if !patterns.frequent_amounts.is_empty() {
        section.push_str("### Frequent Amounts\n\n");
        section.push_str("| Amount | Count |\n|---:|:---:|\n");
        for f in &patterns.frequent_amounts {
            section.push_str(&format!("| {:.2} | {} |\n", f.amount, f.count));
        }
        section.push('\n');
    }

    if !patterns.patterns.is_empty() {
        section.push_str("### Digit Patterns\n\n");
        section.push_str("| Pattern | Count | Examples |\n|:---|:---:|:---|\n");
        for p in &patterns.patterns {
            let examples: Vec<String> = p.examples.iter().map(|e| e.to_string()).collect();
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                p.pattern,
                p.count,
                examples.join(", ")
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the recommendations section.
fn generate_recommendations_section(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Recommendations\n\n");
    for (i, rec) in recommendations.iter().enumerate() {
        section.push_str(&format!("### {}. {}\n\n", i + 1, rec.title));
        section.push_str(&format!("{}\n\n", rec.description));
        for step in &rec.steps {
            section.push_str(&format!("- {}\n", step));
        }
        section.push('\n');
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by FecAudit v{}. Findings are indicators for review, not proof of fraud.*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AuditReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
