//! FecAudit - FEC ledger anomaly and fraud-risk analyzer
//!
//! A CLI tool that loads a French FEC accounting export, runs a set of
//! accounting and fraud heuristics over it and writes an audit report.
//!
//! Exit codes:
//!   0 - Success (risk below threshold, or no threshold set)
//!   1 - Runtime error (unreadable file, missing column, bad config, etc.)
//!   2 - Risk above --fail-on / --fail-above threshold

use anyhow::{Context, Result};
use fecaudit::analysis;
use fecaudit::cli::{Args, OutputFormat};
use fecaudit::config::{Config, DEFAULT_CONFIG_FILE};
use fecaudit::ingest::{self, LoadOptions};
use fecaudit::models::Entry;
use fecaudit::report::{self, AuditReport};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("FecAudit v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_audit(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Audit failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .fecaudit.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize output, delimiter, report format and thresholds.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete audit workflow. Returns exit code (0 or 2).
fn run_audit(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let Some(ref input) = args.file else {
        anyhow::bail!("No input file given");
    };

    // Step 1: Load the ledger
    if !args.quiet {
        println!("📥 Loading ledger: {}", input.display());
    }
    let options = LoadOptions {
        delimiter: config.delimiter()?,
        show_progress: !args.quiet,
    };
    let entries = ingest::load_path(input, &options)
        .with_context(|| format!("Failed to load ledger {}", input.display()))?;
    info!("Loaded {} entries", entries.len());

    if entries.is_empty() {
        warn!("No ledger entries found in {}", input.display());
    }

    // Handle --dry-run: summarize the input and exit
    if args.dry_run {
        return handle_dry_run(&entries);
    }

    // Step 2: Run the detectors and aggregate
    if !args.quiet {
        println!("🔬 Running analysis on {} entries...", entries.len());
    }
    let analysis = analysis::analyze(&entries);
    let analytics = analysis::aggregate(&entries, &analysis);

    // Step 3: Build and save the report
    let duration = start_time.elapsed().as_secs_f64();
    let report = AuditReport::new(input.display().to_string(), analysis, analytics, duration);

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, config.report.max_examples)
        }
    };

    let output_path = PathBuf::from(&config.general.output);
    report::write_report(&output, &output_path)?;

    let metadata = &report.metadata;
    if !args.quiet {
        println!("\n📊 Analysis Summary:");
        println!("   Entries analyzed: {}", metadata.total_entries);
        println!("   Anomalies found: {}", report.analytics.total_count);
        println!(
            "   Risk: {} {} ({}/100)",
            metadata.risk_level.emoji(),
            metadata.risk_level,
            metadata.risk_score
        );
        for critical in &report.critical_anomalies {
            println!(
                "   - {} {}: {}",
                critical.severity.emoji(),
                critical.kind,
                critical.detail
            );
        }
        println!("   Duration: {:.1}s", duration);
        println!(
            "\n✅ Audit complete! Report saved to: {}",
            output_path.display()
        );
    }

    // Check --fail-on / --fail-above thresholds
    if config.audit.is_exceeded_by(metadata.risk_score) {
        eprintln!(
            "\n⛔ Risk score {} ({}) exceeds the configured threshold. Failing (exit code 2).",
            metadata.risk_score, metadata.risk_level
        );
        return Ok(2);
    }

    Ok(0)
}

/// Handle --dry-run: print what was loaded, exit without analysis.
fn handle_dry_run(entries: &[Entry]) -> Result<i32> {
    println!("\n🔍 Dry run: ledger loaded, no detectors run...\n");

    let summary = analysis::summarize(entries);
    let journals: BTreeSet<&str> = entries.iter().map(|e| e.journal_code.as_str()).collect();

    println!("   Entries: {}", summary.total_entries);
    println!(
        "   Journals ({}): {}",
        journals.len(),
        journals.into_iter().collect::<Vec<_>>().join(", ")
    );
    match (summary.date_range.start, summary.date_range.end) {
        (Some(start), Some(end)) => println!("   Period: {} to {}", start, end),
        _ => println!("   Period: no valid posting dates"),
    }
    println!(
        "   Total debit: {:.2} | Total credit: {:.2}",
        summary.total_debit, summary.total_credit
    );

    println!("\n✅ Dry run complete. No report was written.");
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
