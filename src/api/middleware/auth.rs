//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, validates it against the
//! session store, and injects the authenticated `SessionUser` into
//! request extensions for downstream handlers. A second layer gates
//! admin-only routes.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::{SessionError, SessionUser};
use crate::models::Role;

/// Require a valid bearer token.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
/// On success: injects `SessionUser` and adds `Cache-Control: no-store`.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    // 1. Extract bearer token
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    // 2. Validate against the session store
    let user = {
        let sessions = ctx.state.read_sessions()?;
        sessions.validate(&token).map_err(|e| match e {
            SessionError::Expired => ApiError::TokenExpired,
            SessionError::Invalid => ApiError::Unauthorized,
        })?
    }; // RwLockReadGuard dropped here, before any .await

    // 3. Inject identity for downstream handlers
    req.extensions_mut().insert(user);

    // 4. Process request
    let mut response = next.run(req).await;
    response.headers_mut().insert(
        "Cache-Control",
        axum::http::HeaderValue::from_static("no-store"),
    );
    Ok(response)
}

/// Handler-side admin check for admin-only actions that share a path
/// with clinician routes (e.g. `DELETE /api/patients/:id`).
pub fn ensure_admin(user: &SessionUser) -> Result<(), ApiError> {
    if user.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Require the admin role. Runs inside `require_auth`, which has
/// already injected `SessionUser`.
pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    let is_admin = req
        .extensions()
        .get::<SessionUser>()
        .map(|u| u.role == Role::Admin)
        .unwrap_or(false);

    if !is_admin {
        return ApiError::Forbidden.into_response();
    }
    next.run(req).await
}
