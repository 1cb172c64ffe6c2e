// ==========================================
// Water Survey Catalog - Configuration
// ==========================================
// Runtime settings with environment overrides. Every knob
// has a default good enough for a development run.
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// Environment variable names
const ENV_SOURCE_URL: &str = "AQUA_SURVEY_SOURCE_URL";
const ENV_FETCH_TIMEOUT_SECS: &str = "AQUA_SURVEY_FETCH_TIMEOUT_SECS";
const ENV_CACHE_TTL_SECS: &str = "AQUA_SURVEY_CACHE_TTL_SECS";
const ENV_CHUNK_SIZE: &str = "AQUA_SURVEY_CHUNK_SIZE";
const ENV_DB_PATH: &str = "AQUA_SURVEY_DB_PATH";

// ==========================================
// AppConfig
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP URL of the published survey workbook.
    pub source_url: String,
    /// Remote fetch timeout (seconds).
    pub fetch_timeout_secs: u64,
    /// How long a cached sheet snapshot stays fresh (seconds).
    pub cache_ttl_secs: u64,
    /// Upsert chunk size for the persisted store.
    pub upsert_chunk_size: usize,
    /// SQLite catalog path.
    pub db_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            fetch_timeout_secs: 15,
            cache_ttl_secs: 3600,
            upsert_chunk_size: 100,
            db_path: default_db_path(),
        }
    }
}

impl AppConfig {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            source_url: env_string(ENV_SOURCE_URL).unwrap_or(defaults.source_url),
            fetch_timeout_secs: env_parsed(ENV_FETCH_TIMEOUT_SECS)
                .unwrap_or(defaults.fetch_timeout_secs),
            cache_ttl_secs: env_parsed(ENV_CACHE_TTL_SECS).unwrap_or(defaults.cache_ttl_secs),
            upsert_chunk_size: env_parsed(ENV_CHUNK_SIZE).unwrap_or(defaults.upsert_chunk_size),
            db_path: env_string(ENV_DB_PATH).unwrap_or(defaults.db_path),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

/// Default catalog location under the user data directory,
/// falling back to the working directory.
pub fn default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("aqua-survey")
        .join("catalog.db")
        .to_string_lossy()
        .to_string()
}
