//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Severity;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// FecAudit - anomaly and fraud-indicator analyzer for FEC ledger exports
///
/// Reads a French "Fichier des Écritures Comptables" export, runs a battery
/// of accounting heuristics over it and writes a Markdown or JSON audit
/// report with a 0-100 risk score.
///
/// Examples:
///   fecaudit 123456789FEC20231231.txt
///   fecaudit ledger.csv --delimiter ';' --format json -o audit.json
///   fecaudit ledger.txt --fail-on high
///   fecaudit ledger.txt --dry-run
///   fecaudit --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// FEC export to analyze (tab, pipe, semicolon or comma separated)
    #[arg(value_name = "FILE", required_unless_present = "init_config")]
    pub file: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the [general] output setting, or fecaudit_report.md.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT", env = "FECAUDIT_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .fecaudit.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Field delimiter of the input file
    ///
    /// A single ASCII character, or "tab". Detected from the header line
    /// when not given.
    #[arg(short, long, value_name = "CHAR")]
    pub delimiter: Option<String>,

    /// Maximum number of findings listed per report section
    #[arg(long, value_name = "COUNT")]
    pub max_examples: Option<usize>,

    /// Fail if the risk level is at or above this level
    ///
    /// Useful for CI pipelines. Exit code 2 when threshold is exceeded.
    /// Values: high, medium, low
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Fail if the risk score is strictly above this value (0-100)
    #[arg(long, value_name = "SCORE")]
    pub fail_above: Option<u8>,

    /// Dry run: load and summarize the file without running detectors
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .fecaudit.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Risk level for --fail-on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FailOnLevel {
    Low,
    Medium,
    High,
}

impl From<FailOnLevel> for Severity {
    fn from(level: FailOnLevel) -> Self {
        match level {
            FailOnLevel::Low => Severity::Low,
            FailOnLevel::Medium => Severity::Medium,
            FailOnLevel::High => Severity::High,
        }
    }
}

/// Parse a delimiter setting into a single byte.
pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() && c != '\n' && c != '"' => Ok(c as u8),
                _ => Err(format!(
                    "Delimiter must be a single ASCII character or 'tab', got '{}'",
                    value
                )),
            }
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref delimiter) = self.delimiter {
            parse_delimiter(delimiter)?;
        }

        if self.max_examples == Some(0) {
            return Err("Max examples must be at least 1".to_string());
        }

        if let Some(score) = self.fail_above {
            if score > 100 {
                return Err("Fail-above score must be between 0 and 100".to_string());
            }
        }

        // Validate input file if provided
        if let Some(ref file) = self.file {
            if !file.exists() {
                return Err(format!("Input file does not exist: {}", file.display()));
            }
            if !file.is_file() {
                return Err(format!("Input path is not a file: {}", file.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
