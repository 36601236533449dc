//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use typelab_core::kst::{self, KST_OFFSET_MINUTES};
use typelab_infra::database::DatabaseConfig;

const DEFAULT_GARDEN_START: (i32, u32, u32) = (2025, 11, 1);
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub garden: GardenConfig,
    pub media: MediaConfig,
}

/// Fixed first day of the garden and the offset used to bucket days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GardenConfig {
    pub start_date: NaiveDate,
    pub offset_minutes: i32,
}

impl Default for GardenConfig {
    fn default() -> Self {
        let (y, m, d) = DEFAULT_GARDEN_START;
        Self {
            start_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN),
            offset_minutes: KST_OFFSET_MINUTES,
        }
    }
}

/// Where uploads are written and how they are addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub base_url: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
            .with_database(DatabaseConfig::from_env())
    }

    /// Build from an arbitrary variable source. The database is left unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "PORT", 8080);

        let defaults = GardenConfig::default();
        let garden = GardenConfig {
            start_date: parse_or(&lookup, "GARDEN_START_DATE", defaults.start_date),
            offset_minutes: garden_offset(&lookup, defaults.offset_minutes),
        };

        let media = MediaConfig {
            root: lookup("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./media")),
            base_url: lookup("MEDIA_BASE_URL")
                .unwrap_or_else(|| format!("http://{host}:{port}/media")),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        };

        Self {
            host,
            port,
            database: None,
            garden,
            media,
        }
    }

    pub fn with_database(mut self, database: Option<DatabaseConfig>) -> Self {
        self.database = database;
        self
    }
}

/// `GARDEN_OFFSET_MINUTES`, clamped to what a fixed offset can hold so the
/// reported offset always matches the one days are bucketed in.
fn garden_offset(lookup: &impl Fn(&str) -> Option<String>, default: i32) -> i32 {
    let requested = parse_or(lookup, "GARDEN_OFFSET_MINUTES", default);
    let clamped = kst::clamp_offset_minutes(requested);
    if clamped != requested {
        tracing::warn!(requested, clamped, "GARDEN_OFFSET_MINUTES out of range, clamping");
    }
    clamped
}

/// Parse `key`, falling back to `default` with a warning when malformed.
fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, ?default, "Invalid configuration value, using default");
            default
        }),
    }
}
