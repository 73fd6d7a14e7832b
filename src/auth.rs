//! Password hashing, bearer-token sessions and login lockout.
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 hashes with a per-user
//! random salt. Session tokens are opaque 32-byte values handed to the
//! client as URL-safe base64; only their SHA-256 hash is kept server side.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::models::Role;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const SALT_LENGTH: usize = 32;
const HASH_LENGTH: usize = 32;

/// Session lifetime: 8 hours.
const SESSION_TTL_SECS: u64 = 8 * 3600;

/// Login lockout: 5 failures locks a source for 15 minutes.
const LOCKOUT_THRESHOLD: u32 = 5;
const LOCKOUT_SECS: u64 = 15 * 60;

const B64: base64::engine::GeneralPurpose = base64::engine::general_purpose::URL_SAFE_NO_PAD;

// ═══════════════════════════════════════════════════════════
// Password hashing
// ═══════════════════════════════════════════════════════════

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

fn derive(password: &str, salt: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut hash);
    hash
}

/// Hash a password with a fresh salt. Returns (hash, salt), base64-encoded.
pub fn hash_password(password: &str) -> (String, String) {
    let salt = generate_salt();
    let hash = derive(password, &salt);
    (B64.encode(hash), B64.encode(salt))
}

/// Verify a password against stored hash + salt (constant-time compare).
pub fn verify_password(password: &str, stored_hash: &str, stored_salt: &str) -> bool {
    let Ok(salt) = B64.decode(stored_salt) else {
        return false;
    };
    let Ok(expected) = B64.decode(stored_hash) else {
        return false;
    };
    let actual = derive(password, &salt);
    actual.ct_eq(expected.as_slice()).into()
}

// ═══════════════════════════════════════════════════════════
// Bearer tokens
// ═══════════════════════════════════════════════════════════

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    B64.encode(bytes)
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

// ═══════════════════════════════════════════════════════════
// Session store
// ═══════════════════════════════════════════════════════════

/// Authenticated identity attached to a session.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

struct Session {
    user: SessionUser,
    expires_at: Instant,
}

/// Why a token failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    Invalid,
    Expired,
}

/// In-memory store of active sessions keyed by token hash.
pub struct SessionStore {
    sessions: HashMap<[u8; 32], Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            ttl: Duration::from_secs(SESSION_TTL_SECS),
        }
    }

    #[cfg(test)]
    fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    /// Issue a token for the given identity. Returns the plaintext token —
    /// the only time it exists server side.
    pub fn issue(&mut self, user: SessionUser) -> String {
        self.cleanup();
        let token = generate_token();
        self.sessions.insert(
            hash_token(&token),
            Session {
                user,
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    /// Validate a token and return the identity behind it.
    pub fn validate(&self, token: &str) -> Result<SessionUser, SessionError> {
        let session = self
            .sessions
            .get(&hash_token(token))
            .ok_or(SessionError::Invalid)?;
        if Instant::now() > session.expires_at {
            return Err(SessionError::Expired);
        }
        Ok(session.user.clone())
    }

    /// Revoke a token (logout). Unknown tokens are a no-op.
    pub fn revoke(&mut self, token: &str) {
        self.sessions.remove(&hash_token(token));
    }

    /// Drop every session belonging to the given user.
    pub fn revoke_user(&mut self, user_id: &Uuid) {
        self.sessions.retain(|_, s| s.user.user_id != *user_id);
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    fn cleanup(&mut self) {
        let now = Instant::now();
        self.sessions.retain(|_, s| now <= s.expires_at);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Login lockout
// ═══════════════════════════════════════════════════════════

struct LockoutEntry {
    failures: u32,
    locked_until: Option<Instant>,
}

/// Tracks failed logins per source and locks out brute-force attempts.
pub struct LoginLockout {
    entries: HashMap<String, LockoutEntry>,
}

impl LoginLockout {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn is_locked(&self, source: &str) -> bool {
        self.entries
            .get(source)
            .and_then(|e| e.locked_until)
            .is_some_and(|until| Instant::now() < until)
    }

    pub fn record_failure(&mut self, source: &str) {
        let entry = self
            .entries
            .entry(source.to_string())
            .or_insert(LockoutEntry {
                failures: 0,
                locked_until: None,
            });
        entry.failures += 1;
        if entry.failures >= LOCKOUT_THRESHOLD {
            entry.locked_until = Some(Instant::now() + Duration::from_secs(LOCKOUT_SECS));
        }
    }

    pub fn clear(&mut self, source: &str) {
        self.entries.remove(source);
    }
}

impl Default for LoginLockout {
    fn default() -> Self {
        Self::new()
    }
}
