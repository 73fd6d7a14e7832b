//! Login and logout endpoints.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::{verify_password, SessionUser};
use crate::db::repository::find_user_by_username;
use crate::models::Role;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
}

/// `POST /api/auth/login` — exchange credentials for a bearer token.
///
/// Failed attempts are lockout-tracked per username so a brute-force
/// run locks the account source rather than hammering PBKDF2 forever.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = req.username.trim().to_string();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("username and password required".into()));
    }

    {
        let lockout = ctx.state.lockout()?;
        if lockout.is_locked(&username) {
            return Err(ApiError::Unauthorized);
        }
    }

    let conn = ctx.state.open_db()?;
    let user = match find_user_by_username(&conn, &username)? {
        Some(user) if verify_password(&req.password, &user.password_hash, &user.salt) => user,
        _ => {
            ctx.state.lockout()?.record_failure(&username);
            tracing::warn!(%username, "Failed login attempt");
            return Err(ApiError::Unauthorized);
        }
    };

    ctx.state.lockout()?.clear(&username);

    let token = {
        let mut sessions = ctx.state.write_sessions()?;
        sessions.issue(SessionUser {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        })
    };

    tracing::info!(username = %user.username, "Login successful");
    Ok(Json(LoginResponse {
        token,
        username: user.username,
        role: user.role,
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// `POST /api/auth/logout` — revoke the presented bearer token.
pub async fn logout(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, ApiError> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    ctx.state.write_sessions()?.revoke(token);
    Ok(Json(LogoutResponse { logged_out: true }))
}
