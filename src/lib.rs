//! FecAudit - anomaly and fraud-indicator analysis for FEC ledger exports.
//!
//! The pipeline is `ingest` (delimited text to [`models::Entry`]), then
//! [`analysis::analyze`] (every detector once), then [`analysis::aggregate`]
//! (journal, account, period and pattern views plus the risk score), then
//! `report` (Markdown or JSON rendering).

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detectors;
pub mod ingest;
pub mod models;
pub mod report;
