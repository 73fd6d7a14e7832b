//! CSV roster ingestion.
//!
//! Parsing is a small hand-rolled state machine over the input, no
//! external parser. Malformed rows are skipped and reported, never
//! abort the batch.

pub mod csv;
pub mod patients;

pub use csv::{parse_csv, CsvRecord};
pub use patients::{import_patients, ImportSummary, RowIssue};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Empty input: no header row")]
    EmptyInput,

    #[error("Missing required column(s): {0}")]
    MissingColumns(String),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}
