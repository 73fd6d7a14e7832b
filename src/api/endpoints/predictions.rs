//! Risk prediction endpoints.
//!
//! Running an assessment merges the stored patient record into the
//! submitted feature vector (record values fill absent features), runs
//! the deterministic scoring and persists the result.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::{Page, Pagination, Patient, Prediction};
use crate::scoring::{assess, RiskFeatures};

use super::patients::parse_id;

#[derive(Deserialize)]
pub struct AssessRequest {
    pub condition: String,
    #[serde(default)]
    pub features: RiskFeatures,
}

/// Fill feature gaps from the stored patient record.
fn merge_features(mut features: RiskFeatures, patient: &Patient) -> RiskFeatures {
    if features.age.is_none() {
        features.age = Some(patient.age_on(Utc::now().date_naive()));
    }
    if features.years_exposure.is_none() {
        features.years_exposure = Some(patient.years_exposure);
    }
    features.smoker = features.smoker || patient.smoker;
    features
}

/// `POST /api/patients/:id/predictions` — run and store an assessment.
pub async fn assess_patient(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(req): Json<AssessRequest>,
) -> Result<(StatusCode, Json<Prediction>), ApiError> {
    if req.condition.trim().is_empty() {
        return Err(ApiError::BadRequest("condition required".into()));
    }

    let id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;
    let patient = repository::get_patient(&conn, &id)?;

    let features = merge_features(req.features, &patient);
    let assessment = assess(&req.condition, &features);

    let prediction = Prediction {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        condition: assessment.condition,
        score: assessment.score,
        risk_level: assessment.risk_level,
        factors: assessment.factors,
        differential: assessment.differential,
        summary: assessment.summary,
        created_at: Utc::now(),
    };
    repository::insert_prediction(&conn, &prediction)?;

    tracing::info!(
        patient_id = %patient.id,
        condition = %prediction.condition,
        score = prediction.score,
        "Risk assessment stored"
    );
    Ok((StatusCode::CREATED, Json(prediction)))
}

#[derive(Deserialize)]
pub struct PredictionListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /api/patients/:id/predictions` — assessment history.
pub async fn history(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Query(query): Query<PredictionListQuery>,
) -> Result<Json<Page<Prediction>>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;
    // 404 for unknown patients rather than an empty page
    repository::get_patient(&conn, &id)?;
    let page = repository::list_predictions_for_patient(
        &conn,
        &id,
        Pagination::from_parts(query.page, query.per_page),
    )?;
    Ok(Json(page))
}

/// `GET /api/predictions/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Prediction>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(repository::get_prediction(&conn, &id)?))
}
