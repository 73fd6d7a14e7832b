//! Case artifact upload and comparison endpoints.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::{ArtifactKind, CaseArtifact, ComparisonResult};
use crate::scoring::compare::{compare_checksums, content_checksum};

use super::patients::parse_id;

#[derive(Deserialize)]
pub struct UploadQuery {
    pub file_name: String,
    pub kind: ArtifactKind,
}

/// `POST /api/patients/:id/artifacts` — register an uploaded file.
///
/// The raw body is hashed and discarded; only the metadata row is kept.
pub async fn upload(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<CaseArtifact>), ApiError> {
    if query.file_name.trim().is_empty() {
        return Err(ApiError::BadRequest("file_name required".into()));
    }
    if body.is_empty() {
        return Err(ApiError::BadRequest("empty upload".into()));
    }

    let patient_id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;
    // 404 before hashing work if the patient is unknown
    repository::get_patient(&conn, &patient_id)?;

    let artifact = CaseArtifact {
        id: Uuid::new_v4(),
        patient_id,
        file_name: query.file_name.trim().to_string(),
        kind: query.kind,
        byte_size: body.len() as u64,
        checksum: content_checksum(&body),
        uploaded_at: Utc::now(),
    };
    repository::insert_artifact(&conn, &artifact)?;

    tracing::info!(
        artifact_id = %artifact.id,
        patient_id = %patient_id,
        bytes = artifact.byte_size,
        "Case artifact registered"
    );
    Ok((StatusCode::CREATED, Json(artifact)))
}

#[derive(serde::Serialize)]
pub struct ArtifactListResponse {
    pub artifacts: Vec<CaseArtifact>,
}

/// `GET /api/patients/:id/artifacts`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ArtifactListResponse>, ApiError> {
    let patient_id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;
    repository::get_patient(&conn, &patient_id)?;
    let artifacts = repository::list_artifacts_for_patient(&conn, &patient_id)?;
    Ok(Json(ArtifactListResponse { artifacts }))
}

#[derive(Deserialize)]
pub struct CompareRequest {
    pub left_artifact_id: Uuid,
    pub right_artifact_id: Uuid,
}

/// `POST /api/artifacts/compare` — deterministic pairwise comparison.
pub async fn compare(
    State(ctx): State<ApiContext>,
    Json(req): Json<CompareRequest>,
) -> Result<(StatusCode, Json<ComparisonResult>), ApiError> {
    let conn = ctx.state.open_db()?;
    let left = repository::get_artifact(&conn, &req.left_artifact_id)?;
    let right = repository::get_artifact(&conn, &req.right_artifact_id)?;

    let (similarity, regions) = compare_checksums(&left.checksum, &right.checksum);
    let result = ComparisonResult {
        id: Uuid::new_v4(),
        left_artifact_id: left.id,
        right_artifact_id: right.id,
        similarity,
        regions,
        compared_at: Utc::now(),
    };
    repository::insert_comparison(&conn, &result)?;

    tracing::info!(
        left = %left.id,
        right = %right.id,
        similarity,
        "Artifacts compared"
    );
    Ok((StatusCode::CREATED, Json(result)))
}

#[derive(serde::Serialize)]
pub struct ComparisonListResponse {
    pub comparisons: Vec<ComparisonResult>,
}

/// `GET /api/artifacts/:id/comparisons` — history for one artifact.
pub async fn comparisons(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ComparisonListResponse>, ApiError> {
    let artifact_id = parse_id(&id)?;
    let conn = ctx.state.open_db()?;
    repository::get_artifact(&conn, &artifact_id)?;
    let comparisons = repository::list_comparisons_for_artifact(&conn, &artifact_id)?;
    Ok(Json(ComparisonListResponse { comparisons }))
}
