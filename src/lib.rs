pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod ingest;
pub mod models;
pub mod report;
pub mod scoring;
pub mod state;

use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::models::{Role, User};
use crate::state::AppState;

/// Initialize the data directory and database, then serve the API
/// until interrupted.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("CareDesk starting v{}", config::APP_VERSION);

    let data_dir = config::app_data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let db_path = config::database_path();
    let state = Arc::new(AppState::new(db_path.clone()));

    // Opening once at startup runs pending migrations before traffic
    let conn = state.open_db()?;
    tracing::info!(path = %db_path.display(), "Database ready");

    bootstrap_admin(&conn)?;
    drop(conn);

    let mut server = api::start_api_server(Arc::clone(&state), config::bind_addr())
        .await
        .map_err(std::io::Error::other)?;
    tracing::info!(addr = %server.session.server_addr, "CareDesk serving");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, shutting down");

    server.shutdown();
    if let Err(e) = state.flush_and_prune_audit() {
        tracing::warn!("Final audit flush failed: {e}");
    }
    Ok(())
}

/// Create the initial admin account on first run.
///
/// The generated password is printed to the log exactly once; the
/// operator is expected to log in and create named accounts.
fn bootstrap_admin(conn: &rusqlite::Connection) -> Result<(), db::DatabaseError> {
    if db::repository::any_admin_exists(conn)? {
        return Ok(());
    }

    let password = std::env::var("CAREDESK_ADMIN_PASSWORD")
        .ok()
        .filter(|p| p.len() >= 8)
        .unwrap_or_else(auth::generate_token);
    let (password_hash, salt) = auth::hash_password(&password);

    db::repository::insert_user(
        conn,
        &User {
            id: Uuid::new_v4(),
            username: "admin".into(),
            password_hash,
            salt,
            role: Role::Admin,
            created_at: Utc::now(),
        },
    )?;

    tracing::warn!("Created initial admin account 'admin' with password: {password}");
    Ok(())
}
