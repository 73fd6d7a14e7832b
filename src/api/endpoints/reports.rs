//! Patient report downloads.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::report::{assemble_report, render_html, render_pdf, render_text};

use super::patients::parse_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Text,
    Html,
    Pdf,
}

#[derive(Deserialize)]
pub struct ReportQuery {
    pub format: Option<ReportFormat>,
}

/// `GET /api/patients/:id/report?format=text|html|pdf` — download a
/// patient summary. Defaults to plain text.
pub async fn download(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let patient_id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;
    let report = assemble_report(&conn, &patient_id, Utc::now().date_naive())?;

    let file_stem = format!(
        "report-{}-{}",
        report.patient.last_name.to_lowercase(),
        report.as_of
    );

    let (content_type, file_name, body) = match query.format.unwrap_or(ReportFormat::Text) {
        ReportFormat::Text => (
            "text/plain; charset=utf-8",
            format!("{file_stem}.txt"),
            render_text(&report).into_bytes(),
        ),
        ReportFormat::Html => (
            "text/html; charset=utf-8",
            format!("{file_stem}.html"),
            render_html(&report).into_bytes(),
        ),
        ReportFormat::Pdf => (
            "application/pdf",
            format!("{file_stem}.pdf"),
            render_pdf(&report)?,
        ),
    };

    let mut response = (StatusCode::OK, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type),
    );
    if let Ok(disposition) =
        HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
    {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, disposition);
    }
    Ok(response)
}
