//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.fecaudit.toml` files.

use crate::cli::{FailOnLevel, OutputFormat};
use crate::models::Severity;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".fecaudit.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input parsing settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// CI gating settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "fecaudit_report.md".to_string()
}

/// Input parsing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// Field delimiter (a single character or "tab"); auto-detected if unset.
    #[serde(default)]
    pub delimiter: Option<String>,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Maximum findings listed per report section.
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            max_examples: default_max_examples(),
        }
    }
}

fn default_max_examples() -> usize {
    10
}

/// Exit-code thresholds for CI use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Exit with code 2 when the risk level reaches this level.
    #[serde(default)]
    pub fail_on: Option<FailOnLevel>,

    /// Exit with code 2 when the risk score is above this value.
    #[serde(default)]
    pub fail_above: Option<u8>,
}

impl AuditConfig {
    /// Whether a risk score trips either configured threshold.
    pub fn is_exceeded_by(&self, risk_score: u8) -> bool {
        let level_hit = self
            .fail_on
            .is_some_and(|level| Severity::from_risk_score(risk_score) >= Severity::from(level));
        let score_hit = self.fail_above.is_some_and(|limit| risk_score > limit);
        level_hit || score_hit
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.fecaudit.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(ref delimiter) = args.delimiter {
            self.input.delimiter = Some(delimiter.clone());
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(max_examples) = args.max_examples {
            self.report.max_examples = max_examples;
        }

        if let Some(level) = args.fail_on {
            self.audit.fail_on = Some(level);
        }
        if let Some(score) = args.fail_above {
            self.audit.fail_above = Some(score);
        }
    }

    /// Delimiter byte from the input settings, if one is configured.
    pub fn delimiter(&self) -> Result<Option<u8>> {
        self.input
            .delimiter
            .as_deref()
            .map(crate::cli::parse_delimiter)
            .transpose()
            .map_err(|e| anyhow::anyhow!(e))
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "fecaudit_report.md");
        assert_eq!(config.report.format, OutputFormat::Markdown);
        assert_eq!(config.report.max_examples, 10);
        assert!(config.input.delimiter.is_none());
        assert!(config.audit.fail_on.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "audit.json"
verbose = true

[input]
delimiter = "tab"

[report]
format = "json"
max_examples = 25

[audit]
fail_on = "high"
fail_above = 70
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "audit.json");
        assert!(config.general.verbose);
        assert_eq!(config.delimiter().unwrap(), Some(b'\t'));
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.max_examples, 25);
        assert_eq!(config.audit.fail_on, Some(FailOnLevel::High));
        assert_eq!(config.audit.fail_above, Some(70));
    }

    #[test]
    fn test_invalid_delimiter_setting() {
        let config: Config = toml::from_str("[input]\ndelimiter = \"::\"\n").unwrap();
        assert!(config.delimiter().is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config: Config = toml::from_str("[report]\nmax_examples = 3\n").unwrap();
        let args = Args::try_parse_from([
            "fecaudit",
            "ledger.txt",
            "--max-examples",
            "7",
            "-o",
            "out.md",
        ])
        .unwrap();

        config.merge_with_args(&args);

        assert_eq!(config.report.max_examples, 7);
        assert_eq!(config.general.output, "out.md");
        assert!(config.audit.fail_on.is_none());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[general]\noutput = \"x.md\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.general.output, "x.md");

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "not toml [").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_audit_thresholds() {
        let mut audit = AuditConfig::default();
        assert!(!audit.is_exceeded_by(100));

        audit.fail_on = Some(FailOnLevel::Medium);
        assert!(!audit.is_exceeded_by(29));
        assert!(audit.is_exceeded_by(30));
        assert!(audit.is_exceeded_by(75));

        let audit = AuditConfig {
            fail_on: None,
            fail_above: Some(40),
        };
        assert!(!audit.is_exceeded_by(40));
        assert!(audit.is_exceeded_by(41));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.report.max_examples, 10);
    }
}
