//! Dashboard endpoint.

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::dashboard::{fetch_dashboard, DashboardData};

/// `GET /api/dashboard` — aggregated clinic overview.
pub async fn overview(
    State(ctx): State<ApiContext>,
) -> Result<Json<DashboardData>, ApiError> {
    let conn = ctx.state.open_db()?;
    let data = fetch_dashboard(&conn, Utc::now())?;
    Ok(Json(data))
}
