//! Appointment endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{self, AppointmentFilter};
use crate::models::{
    Appointment, AppointmentStatus, AppointmentView, NewAppointment, Page, Pagination,
};

use super::patients::parse_id;

#[derive(Deserialize)]
pub struct AppointmentListQuery {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /api/appointments` — paginated joined listing with filters.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Page<AppointmentView>>, ApiError> {
    let conn = ctx.state.open_db()?;
    let page = repository::list_appointments(
        &conn,
        &AppointmentFilter {
            patient_id: query.patient_id,
            doctor_id: query.doctor_id,
            status: query.status,
        },
        Pagination::from_parts(query.page, query.per_page),
    )?;
    Ok(Json(page))
}

/// `POST /api/appointments` — schedule a new appointment.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(new): Json<NewAppointment>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let conn = ctx.state.open_db()?;
    let appointment = repository::create_appointment(&conn, &new)?;
    tracing::info!(appointment_id = %appointment.id, "Appointment scheduled");
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// `GET /api/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(repository::get_appointment(&conn, &id)?))
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `PATCH /api/appointments/:id/status` — complete or cancel.
///
/// Only `scheduled → completed | cancelled` is allowed; anything else
/// is a 400.
pub async fn change_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Appointment>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;

    let current = repository::get_appointment(&conn, &id)?;
    if !current.status.can_transition_to(change.status) {
        return Err(ApiError::BadRequest(format!(
            "cannot change a {} appointment to {}",
            current.status.as_str(),
            change.status.as_str()
        )));
    }

    repository::update_appointment_status(&conn, &id, change.status, change.notes.as_deref())?;
    Ok(Json(repository::get_appointment(&conn, &id)?))
}
