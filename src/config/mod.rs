//! Configuration module for the tracker service.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Which remote store the repository talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Local SQLite file.
    Sqlite { db_path: PathBuf },
    /// PostgREST-compatible HTTP endpoint.
    Postgrest {
        url: String,
        api_key: String,
        table: String,
        timeout: Option<Duration>,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store backend; PostgREST when TRACKER_STORE_URL is set, SQLite otherwise
    pub store: StoreBackend,
    /// File holding the generated owner id
    pub identity_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let store = match lookup("TRACKER_STORE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => StoreBackend::Postgrest {
                url,
                api_key: lookup("TRACKER_STORE_KEY").unwrap_or_default(),
                table: lookup("TRACKER_STORE_TABLE")
                    .unwrap_or_else(|| "applications".to_string()),
                timeout: lookup("TRACKER_STORE_TIMEOUT_SECS")
                    .and_then(|secs| secs.parse().ok())
                    .map(Duration::from_secs),
            },
            None => StoreBackend::Sqlite {
                db_path: lookup("TRACKER_DB_PATH")
                    .unwrap_or_else(|| "./data/tracker.sqlite".to_string())
                    .into(),
            },
        };

        let identity_path = lookup("TRACKER_IDENTITY_PATH")
            .unwrap_or_else(|| "./data/owner_id".to_string())
            .into();

        let bind_addr = lookup("TRACKER_BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid TRACKER_BIND_ADDR format");

        let log_level = lookup("TRACKER_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Self {
            store,
            identity_path,
            bind_addr,
            log_level,
        }
    }
}
