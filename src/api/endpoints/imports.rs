//! CSV ingestion endpoint.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::ingest::{import_patients, ImportSummary};

/// `POST /api/import/patients` — ingest a CSV roster.
///
/// The body is the raw CSV text. Malformed rows are skipped and
/// reported; a missing or incomplete header is a 400 before any insert.
pub async fn patients_csv(
    State(ctx): State<ApiContext>,
    body: String,
) -> Result<Json<ImportSummary>, ApiError> {
    let conn = ctx.state.open_db()?;
    let summary = import_patients(&conn, &body)?;
    Ok(Json(summary))
}
