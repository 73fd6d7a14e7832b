//! Admin-only endpoints: user management and audit queries.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::hash_password;
use crate::db::repository;
use crate::models::{NewUser, User};

/// `POST /api/admin/users` — create an account.
pub async fn create_user(
    State(ctx): State<ApiContext>,
    Json(new): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let username = new.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::BadRequest("username required".into()));
    }
    if new.password.len() < 8 {
        return Err(ApiError::BadRequest("password must be at least 8 characters".into()));
    }

    let (password_hash, salt) = hash_password(&new.password);
    let user = User {
        id: Uuid::new_v4(),
        username,
        password_hash,
        salt,
        role: new.role,
        created_at: Utc::now(),
    };

    let conn = ctx.state.open_db()?;
    repository::insert_user(&conn, &user)?;
    tracing::info!(username = %user.username, role = user.role.as_str(), "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
}

/// `GET /api/admin/users`
pub async fn list_users(
    State(ctx): State<ApiContext>,
) -> Result<Json<UserListResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    let users = repository::list_users(&conn)?;
    Ok(Json(UserListResponse { users }))
}

#[derive(Deserialize)]
pub struct AuditQuery {
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct AuditEntryView {
    pub timestamp: String,
    pub source: String,
    pub action: String,
    pub entity: String,
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct AuditResponse {
    pub entries: Vec<AuditEntryView>,
}

/// `GET /api/admin/audit` — recent access audit entries.
///
/// Flushes the in-memory buffer first so the response includes the
/// entries logged moments ago.
pub async fn audit(
    State(ctx): State<ApiContext>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditResponse>, ApiError> {
    ctx.state.flush_and_prune_audit()?;

    let conn = ctx.state.open_db()?;
    let limit = query.limit.unwrap_or(100).min(1000);
    let entries = repository::recent_audit_entries(&conn, limit)?
        .into_iter()
        .map(|(timestamp, source, action, entity, user_id)| AuditEntryView {
            timestamp,
            source,
            action,
            entity,
            user_id,
        })
        .collect();

    Ok(Json(AuditResponse { entries }))
}
