//! Shared application state for the HTTP API.
//!
//! `AppState` is wrapped in `Arc` at startup and cloned into every
//! handler. Each request opens its own SQLite connection from the
//! configured path; sessions, lockout and the audit buffer live behind
//! their own locks.

use std::path::PathBuf;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::auth::{LoginLockout, SessionStore};
use crate::db;

/// Maximum audit buffer size before flush.
const AUDIT_BUFFER_CAPACITY: usize = 100;

/// Audit entries older than this many days are pruned at flush time.
const AUDIT_RETENTION_DAYS: u32 = 90;

pub struct AppState {
    /// Path of the clinic database. A fresh connection is opened per use.
    pub db_path: PathBuf,
    /// Active bearer-token sessions.
    sessions: RwLock<SessionStore>,
    /// Failed-login tracking.
    lockout: Mutex<LoginLockout>,
    /// Buffered access audit trail.
    audit: AuditLogger,
}

impl AppState {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path,
            sessions: RwLock::new(SessionStore::new()),
            lockout: Mutex::new(LoginLockout::new()),
            audit: AuditLogger::new(),
        }
    }

    /// Open a database connection. Migrations are a no-op after startup.
    pub fn open_db(&self) -> Result<rusqlite::Connection, StateError> {
        db::open_database(&self.db_path).map_err(StateError::Database)
    }

    // ── Sessions ────────────────────────────────────────────

    pub fn read_sessions(&self) -> Result<RwLockReadGuard<'_, SessionStore>, StateError> {
        self.sessions.read().map_err(|_| StateError::LockPoisoned)
    }

    pub fn write_sessions(&self) -> Result<RwLockWriteGuard<'_, SessionStore>, StateError> {
        self.sessions.write().map_err(|_| StateError::LockPoisoned)
    }

    // ── Login lockout ───────────────────────────────────────

    pub fn lockout(&self) -> Result<std::sync::MutexGuard<'_, LoginLockout>, StateError> {
        self.lockout.lock().map_err(|_| StateError::LockPoisoned)
    }

    // ── Audit logging ───────────────────────────────────────

    /// Log an access event. Auto-flushes to the database when the buffer fills.
    pub fn log_access(&self, user_id: Option<&str>, action: &str, entity: &str) {
        let needs_flush = self.audit.log(user_id, action, entity);
        if needs_flush {
            if let Err(e) = self.flush_and_prune_audit() {
                tracing::warn!("Auto-flush audit failed: {e}");
            }
        }
    }

    /// Get the current audit buffer contents (for testing/flush).
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.entries()
    }

    /// Flush the audit buffer to SQLite and prune old rows.
    pub fn flush_and_prune_audit(&self) -> Result<(), StateError> {
        let conn = self.open_db()?;
        self.audit.flush_to_db(&conn)?;
        if let Err(e) = crate::db::repository::prune_audit_log(&conn, AUDIT_RETENTION_DAYS) {
            tracing::warn!("Failed to prune audit log: {e}");
        }
        Ok(())
    }
}

/// Errors from AppState operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

// ═══════════════════════════════════════════════════════════
// Audit logger
// ═══════════════════════════════════════════════════════════

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub user_id: Option<String>,
    pub action: String,
    pub entity: String,
}

/// In-memory audit log buffer. Entries are flushed to SQLite
/// when the buffer reaches capacity or on explicit flush.
pub struct AuditLogger {
    buffer: Mutex<Vec<AuditEntry>>,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::with_capacity(AUDIT_BUFFER_CAPACITY)),
        }
    }

    /// Log an access event to the in-memory buffer.
    /// Returns `true` if the buffer has reached flush threshold.
    pub fn log(&self, user_id: Option<&str>, action: &str, entity: &str) -> bool {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.push(AuditEntry {
                timestamp: chrono::Utc::now(),
                user_id: user_id.map(|s| s.to_string()),
                action: action.to_string(),
                entity: entity.to_string(),
            });
            buf.len() >= AUDIT_BUFFER_CAPACITY
        } else {
            false
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    /// Drain all buffered entries (for flush to SQLite).
    pub fn drain(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|mut buf| buf.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.lock().map(|buf| buf.len()).unwrap_or(0)
    }

    /// Flush buffered entries to SQLite.
    pub fn flush_to_db(&self, conn: &rusqlite::Connection) -> Result<usize, StateError> {
        let entries = self.drain();
        if entries.is_empty() {
            return Ok(0);
        }

        let rows: Vec<crate::db::repository::AuditRow> = entries
            .iter()
            .map(|e| {
                (
                    e.timestamp.to_rfc3339(),
                    "api".to_string(),
                    e.action.clone(),
                    e.entity.clone(),
                    e.user_id.clone(),
                )
            })
            .collect();

        let count = rows.len();
        crate::db::repository::insert_audit_entries(conn, &rows)?;

        tracing::debug!(count, "Flushed audit entries to database");
        Ok(count)
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}
