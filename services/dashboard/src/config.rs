//! services/dashboard/src/config.rs
//!
//! Defines the dashboard's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_AIR_QUALITY_URL: &str = "https://data.sensor.community/airrohr/v1/sensor/58978/";

/// Shortest passphrase accepted for note encryption.
pub const MIN_PASSPHRASE_LEN: usize = 12;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub log_level: Level,
    pub snapshot_path: PathBuf,
    pub air_quality_url: String,
    pub light_schedule_url: String,
    pub light_street: Option<String>,
    pub light_house_number: Option<String>,
    pub newsdata_api_key: Option<String>,
    pub encryption_passphrase: String,
    pub user_id: String,
    pub refresh_tick: Duration,
    pub http_timeout: Duration,
}

// Keeps secrets out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("log_level", &self.log_level)
            .field("snapshot_path", &self.snapshot_path)
            .field("air_quality_url", &self.air_quality_url)
            .field("light_schedule_url", &self.light_schedule_url)
            .field("user_id", &self.user_id)
            .field("refresh_tick", &self.refresh_tick)
            .field("http_timeout", &self.http_timeout)
            .finish_non_exhaustive()
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

fn seconds(name: &str, default: u64) -> Result<Duration, ConfigError> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(Duration::from_secs(default));
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a positive number of seconds", raw),
        )),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Database and Logging Settings ---
        let database_url = required("DATABASE_URL")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let snapshot_path = std::env::var("SNAPSHOT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./dashboard-state.json"));

        // --- Load Feed Settings ---
        let air_quality_url = std::env::var("AIR_QUALITY_URL")
            .unwrap_or_else(|_| DEFAULT_AIR_QUALITY_URL.to_string());
        let light_schedule_url = required("LIGHT_SCHEDULE_URL")?;
        let light_street = std::env::var("LIGHT_STREET").ok();
        let light_house_number = std::env::var("LIGHT_HOUSE_NUMBER").ok();
        let newsdata_api_key = std::env::var("NEWSDATA_API_KEY").ok();

        // --- Load Notes Settings ---
        let encryption_passphrase = required("ENCRYPTION_PASSPHRASE")?;
        if encryption_passphrase.chars().count() < MIN_PASSPHRASE_LEN {
            return Err(ConfigError::InvalidValue(
                "ENCRYPTION_PASSPHRASE".to_string(),
                format!("must be at least {} characters", MIN_PASSPHRASE_LEN),
            ));
        }
        let user_id = required("DASHBOARD_USER_ID")?;

        // --- Load Timing Settings ---
        let refresh_tick = seconds("REFRESH_TICK_SECS", 60)?;
        let http_timeout = seconds("HTTP_TIMEOUT_SECS", 15)?;

        Ok(Self {
            database_url,
            log_level,
            snapshot_path,
            air_quality_url,
            light_schedule_url,
            light_street,
            light_house_number,
            newsdata_api_key,
            encryption_passphrase,
            user_id,
            refresh_tick,
            http_timeout,
        })
    }
}
