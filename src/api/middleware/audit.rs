//! Audit logging middleware.
//!
//! Logs every API request with method, path, response status and the
//! authenticated user when present. Runs innermost, after auth has
//! injected `SessionUser`.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::ApiContext;
use crate::auth::SessionUser;

/// Log API access for the audit trail.
/// Accesses `ApiContext` from request extensions.
pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let ctx = req.extensions().get::<ApiContext>().cloned();
    let user_id = req
        .extensions()
        .get::<SessionUser>()
        .map(|u| u.user_id.to_string());

    let response = next.run(req).await;

    if let Some(ctx) = ctx {
        let status = response.status().as_u16();
        ctx.state.log_access(
            user_id.as_deref(),
            &format!("{method} {path}"),
            &format!("status:{status}"),
        );
    }

    response
}
