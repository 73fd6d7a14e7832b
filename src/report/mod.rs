//! Patient report exports.
//!
//! One assembly step pulls the records; the renderers are pure functions
//! of the assembled `PatientReport`, so identical inputs always produce
//! identical output bytes.

pub mod html;
pub mod pdf;
pub mod summary;
pub mod text;

pub use html::render_html;
pub use pdf::render_pdf;
pub use summary::{assemble_report, PatientReport};
pub use text::render_text;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}
