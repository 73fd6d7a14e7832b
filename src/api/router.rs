//! API router.
//!
//! Three route tiers, all nested under `/api`:
//! - unprotected: login and health check (rate-limited only)
//! - protected: clinic resources, bearer-token auth required
//! - admin: user management and audit queries, admin role required
//!
//! Middleware stack (outermost → innermost):
//! 1. Rate limiter → 2. Auth validator → 3. Audit logger

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::state::AppState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost
/// layer). Endpoint handlers use `State<ApiContext>` (provided via
/// `with_state`).
pub fn api_router(state: Arc<AppState>) -> Router {
    build_router(ApiContext::new(state))
}

fn build_router(ctx: ApiContext) -> Router {
    // Protected routes — bearer token + full middleware stack.
    //
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Rate limit → Auth → Audit (innermost) → Handler
    //
    // Extension must be outermost so all middleware can access ApiContext.
    // Routes with state — .with_state() converts Router<ApiContext> → Router<()>
    // so middleware layers (which use from_fn with state=()) are compatible.
    let protected = Router::new()
        .route("/dashboard", get(endpoints::dashboard::overview))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::delete),
        )
        .route("/patients/:id/report", get(endpoints::reports::download))
        .route(
            "/patients/:id/predictions",
            get(endpoints::predictions::history).post(endpoints::predictions::assess_patient),
        )
        .route(
            "/patients/:id/artifacts",
            get(endpoints::artifacts::list).post(endpoints::artifacts::upload),
        )
        .route("/predictions/:id", get(endpoints::predictions::detail))
        .route("/artifacts/compare", post(endpoints::artifacts::compare))
        .route(
            "/artifacts/:id/comparisons",
            get(endpoints::artifacts::comparisons),
        )
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::create),
        )
        .route("/appointments/:id", get(endpoints::appointments::detail))
        .route(
            "/appointments/:id/status",
            patch(endpoints::appointments::change_status),
        )
        .route(
            "/doctors",
            get(endpoints::doctors::list).post(endpoints::doctors::create),
        )
        .route(
            "/doctors/:id",
            get(endpoints::doctors::detail).delete(endpoints::doctors::delete),
        )
        .route("/import/patients", post(endpoints::imports::patients_csv))
        .route("/auth/logout", post(endpoints::auth::logout))
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx.clone()));

    // Admin tier — same stack plus the role gate.
    let admin = Router::new()
        .route(
            "/admin/users",
            get(endpoints::admin::list_users).post(endpoints::admin::create_user),
        )
        .route("/admin/audit", get(endpoints::admin::audit))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes (rate-limited only, no auth required)
    let unprotected = Router::new()
        .route("/auth/login", post(endpoints::auth::login))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected)
        .nest("/api", admin)
        .nest("/api", unprotected)
        .layer(CorsLayer::permissive())
}
