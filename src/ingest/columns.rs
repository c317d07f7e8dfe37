//! Header resolution for the two column naming conventions of FEC exports.
//!
//! Official exports use the PascalCase names of the FEC specification
//! (`CompteNum`, `EcritureDate`, ...); many tools emit snake_case variants
//! instead (`compte_num`, `ecriture_date`, ...). A field may be present under
//! both names, in which case the PascalCase value wins when non-empty.

use super::LoadError;
use csv::StringRecord;
use std::collections::HashMap;

/// Logical FEC fields the loader knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    JournalCode,
    JournalLib,
    EcritureNum,
    EcritureDate,
    CompteNum,
    PieceRef,
    PieceDate,
    EcritureLib,
    Debit,
    Credit,
    DatePiece,
    EcritureTime,
    /// Generic `date` column, last resort for the posting date.
    Date,
}

impl Field {
    const ALL: [Field; 13] = [
        Field::JournalCode,
        Field::JournalLib,
        Field::EcritureNum,
        Field::EcritureDate,
        Field::CompteNum,
        Field::PieceRef,
        Field::PieceDate,
        Field::EcritureLib,
        Field::Debit,
        Field::Credit,
        Field::DatePiece,
        Field::EcritureTime,
        Field::Date,
    ];

    /// Accepted header names, in order of preference.
    pub fn header_names(self) -> &'static [&'static str] {
        match self {
            Field::JournalCode => &["JournalCode", "journal_code"],
            Field::JournalLib => &["JournalLib", "journal_lib"],
            Field::EcritureNum => &["EcritureNum", "ecriture_num"],
            Field::EcritureDate => &["EcritureDate", "ecriture_date"],
            Field::CompteNum => &["CompteNum", "compte_num"],
            Field::PieceRef => &["PieceRef", "piece_ref"],
            Field::PieceDate => &["PieceDate", "piece_date"],
            Field::EcritureLib => &["EcritureLib", "ecriture_lib"],
            Field::Debit => &["Debit", "debit"],
            Field::Credit => &["Credit", "credit"],
            Field::DatePiece => &["DatePiece", "date_piece"],
            Field::EcritureTime => &["EcritureTime", "ecriture_time"],
            Field::Date => &["date"],
        }
    }
}

/// Column positions of every recognized field, preferred name first.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    positions: HashMap<Field, Vec<usize>>,
}

impl ColumnMap {
    /// Resolve a header record. Fails when the account column or both
    /// amount columns are absent.
    pub fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let names: Vec<&str> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}').trim() } else { h.trim() })
            .collect();

        let mut positions = HashMap::new();
        for field in Field::ALL {
            let found: Vec<usize> = field
                .header_names()
                .iter()
                .filter_map(|wanted| names.iter().position(|name| name == wanted))
                .collect();
            if !found.is_empty() {
                positions.insert(field, found);
            }
        }

        let map = Self { positions };
        if !map.has(Field::CompteNum) {
            return Err(LoadError::MissingColumn("CompteNum".to_string()));
        }
        if !map.has(Field::Debit) && !map.has(Field::Credit) {
            return Err(LoadError::MissingColumn("Debit/Credit".to_string()));
        }
        Ok(map)
    }

    pub fn has(&self, field: Field) -> bool {
        self.positions.contains_key(&field)
    }

    /// Trimmed value of a field: the first non-empty cell among its columns,
    /// or an empty string.
    pub fn get<'r>(&self, record: &'r StringRecord, field: Field) -> &'r str {
        self.positions
            .get(&field)
            .into_iter()
            .flatten()
            .filter_map(|&i| record.get(i))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or("")
    }
}
