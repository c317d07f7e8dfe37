//! Loading of FEC exports into normalized ledger entries.
//!
//! The loader accepts delimited text (tab, pipe, semicolon or comma),
//! resolves the header naming convention, and turns every row into an
//! [`Entry`]. Structural problems (unreadable input, broken CSV, missing
//! required columns) fail the load; defective cells never do.

pub mod columns;
pub mod fields;

use crate::models::Entry;
use columns::{ColumnMap, Field};
use csv::{ReaderBuilder, StringRecord};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Delimiters tried, in order, when none is configured.
pub const CANDIDATE_DELIMITERS: [u8; 4] = [b'\t', b'|', b';', b','];

const PROGRESS_TICK_ROWS: usize = 1_000;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Unsupported input format: {0} (export the ledger as delimited text)")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, LoadError>;

/// Options for loading a ledger.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Field delimiter; detected from the header line when `None`.
    pub delimiter: Option<u8>,
    /// Show a spinner while rows are read.
    pub show_progress: bool,
}

/// Load a ledger file.
pub fn load_path(path: &Path, options: &LoadOptions) -> Result<Vec<Entry>> {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let ext = ext.to_ascii_lowercase();
        if ext == "xlsx" || ext == "xls" {
            return Err(LoadError::UnsupportedFormat(ext));
        }
    }

    info!("Loading ledger from: {}", path.display());
    let file = File::open(path)?;
    load_reader(file, options)
}

/// Load a ledger from any reader.
pub fn load_reader<R: Read>(mut reader: R, options: &LoadOptions) -> Result<Vec<Entry>> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let delimiter = options
        .delimiter
        .unwrap_or_else(|| detect_delimiter(content.lines().next().unwrap_or("")));
    debug!("Using delimiter {:?}", delimiter as char);

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns = ColumnMap::from_headers(rdr.headers()?)?;

    let progress = options.show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Reading ledger rows...");
        pb
    });

    let mut entries = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        entries.push(normalize_row(&columns, &record));

        if let Some(pb) = &progress {
            if entries.len() % PROGRESS_TICK_ROWS == 0 {
                pb.set_message(format!("Read {} rows...", entries.len()));
            }
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message(format!("Read {} rows", entries.len()));
    }

    info!("Loaded {} ledger entries", entries.len());
    Ok(entries)
}

/// First candidate delimiter present in the header line, semicolon otherwise.
pub fn detect_delimiter(header_line: &str) -> u8 {
    CANDIDATE_DELIMITERS
        .into_iter()
        .find(|d| header_line.as_bytes().contains(d))
        .unwrap_or(b';')
}

/// Build one entry from a data row.
fn normalize_row(columns: &ColumnMap, record: &StringRecord) -> Entry {
    let text = |field| columns.get(record, field).to_string();

    let (posting_date, stamp_time) = [Field::DatePiece, Field::PieceDate, Field::EcritureDate, Field::Date]
        .into_iter()
        .map(|field| columns.get(record, field))
        .find(|value| !value.is_empty())
        .and_then(fields::parse_date_time)
        .map_or((None, None), |(date, time)| (Some(date), time));

    let posting_time = fields::parse_time(columns.get(record, Field::EcritureTime)).or(stamp_time);

    Entry {
        journal_code: text(Field::JournalCode),
        journal_label: text(Field::JournalLib),
        account: text(Field::CompteNum),
        entry_number: text(Field::EcritureNum),
        piece_ref: text(Field::PieceRef),
        label: text(Field::EcritureLib),
        debit: fields::parse_amount(columns.get(record, Field::Debit)),
        credit: fields::parse_amount(columns.get(record, Field::Credit)),
        posting_date,
        posting_time,
    }
}
