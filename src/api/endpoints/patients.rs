//! Patient CRUD endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::middleware::auth::ensure_admin;
use crate::api::types::ApiContext;
use crate::auth::SessionUser;
use crate::db::repository;
use crate::models::{NewPatient, Page, Pagination, Patient};

/// Parse a path id or 400.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid id: {raw}")))
}

fn validate(new: &NewPatient) -> Result<(), ApiError> {
    if new.first_name.trim().is_empty() || new.last_name.trim().is_empty() {
        return Err(ApiError::BadRequest("first_name and last_name required".into()));
    }
    if let Some(email) = new.email.as_deref().filter(|e| !e.is_empty()) {
        if !crate::models::valid_email(email) {
            return Err(ApiError::BadRequest(format!("invalid email: {email}")));
        }
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct PatientListQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /api/patients` — paginated listing with optional name search.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Page<Patient>>, ApiError> {
    let conn = ctx.state.open_db()?;
    let page = repository::list_patients(
        &conn,
        query.search.as_deref().filter(|s| !s.trim().is_empty()),
        Pagination::from_parts(query.page, query.per_page),
    )?;
    Ok(Json(page))
}

/// `POST /api/patients` — create one patient.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(new): Json<NewPatient>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    validate(&new)?;
    let conn = ctx.state.open_db()?;
    let patient = repository::create_patient(&conn, &new)?;
    tracing::info!(patient_id = %patient.id, "Patient created");
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(repository::get_patient(&conn, &id)?))
}

/// `PUT /api/patients/:id` — replace editable fields.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(new): Json<NewPatient>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&id)?;
    validate(&new)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(repository::update_patient(&conn, &id, &new)?))
}

/// `DELETE /api/patients/:id` — admin only.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ensure_admin(&user)?;
    let id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;
    repository::delete_patient(&conn, &id)?;
    tracing::info!(patient_id = %id, "Patient deleted");
    Ok(StatusCode::NO_CONTENT)
}
