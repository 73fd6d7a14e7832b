//! Doctor endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::middleware::auth::ensure_admin;
use crate::api::types::ApiContext;
use crate::auth::SessionUser;
use crate::db::repository;
use crate::models::{Doctor, NewDoctor, Page, Pagination};

use super::patients::parse_id;

#[derive(Deserialize)]
pub struct DoctorListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /api/doctors` — paginated listing.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<Page<Doctor>>, ApiError> {
    let conn = ctx.state.open_db()?;
    let page = repository::list_doctors(
        &conn,
        Pagination::from_parts(query.page, query.per_page),
    )?;
    Ok(Json(page))
}

/// `POST /api/doctors` — admin only.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<SessionUser>,
    Json(new): Json<NewDoctor>,
) -> Result<(StatusCode, Json<Doctor>), ApiError> {
    ensure_admin(&user)?;
    if new.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name required".into()));
    }
    let conn = ctx.state.open_db()?;
    let doctor = repository::create_doctor(&conn, &new)?;
    tracing::info!(doctor_id = %doctor.id, "Doctor created");
    Ok((StatusCode::CREATED, Json(doctor)))
}

/// `GET /api/doctors/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Doctor>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(repository::get_doctor(&conn, &id)?))
}

/// `DELETE /api/doctors/:id` — admin only.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ensure_admin(&user)?;
    let id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;
    repository::delete_doctor(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
