use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "CareDesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the HTTP API.
pub const DEFAULT_BIND: &str = "127.0.0.1:8420";

/// Get the application data directory.
/// `CAREDESK_DATA_DIR` overrides; otherwise ~/CareDesk/ (user-visible).
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CAREDESK_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("CareDesk")
}

/// Path of the clinic database file.
pub fn database_path() -> PathBuf {
    app_data_dir().join("clinic.db")
}

/// Socket address the API server binds to.
/// `CAREDESK_BIND` overrides; falls back to the default on parse failure.
pub fn bind_addr() -> SocketAddr {
    std::env::var("CAREDESK_BIND")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| DEFAULT_BIND.parse().expect("default bind address is valid"))
}

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    "info,caredesk=debug".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_under_data_dir() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("clinic.db"));
    }

    #[test]
    fn default_bind_parses() {
        let addr: SocketAddr = DEFAULT_BIND.parse().unwrap();
        assert_eq!(addr.port(), 8420);
    }

    #[test]
    fn app_name_is_caredesk() {
        assert_eq!(APP_NAME, "CareDesk");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }
}
