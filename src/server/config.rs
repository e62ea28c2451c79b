//! Service configuration.
//!
//! Values come from an optional TOML file layered under environment
//! variables; the environment wins wherever both supply a value. The
//! database URL is the only required setting.

use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid value for {name}: {value}")]
    InvalidEnvValue { name: &'static str, value: String },
    #[error("DATABASE_URL is required (environment or config file)")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_dir: String,
    /// Seconds between scheduler passes; each pass re-evaluates which
    /// monitors are due.
    pub scheduler_interval_seconds: u64,
    pub slow_threshold_ms: i32,
    pub max_concurrent_probes: usize,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialAppConfig {
    database_url: Option<String>,
    log_dir: Option<String>,
    scheduler_interval_seconds: Option<u64>,
    slow_threshold_ms: Option<i32>,
    max_concurrent_probes: Option<usize>,
}

fn default_log_dir() -> String {
    "logs".to_string()
}

const DEFAULT_SCHEDULER_INTERVAL_SECONDS: u64 = 60;
const DEFAULT_SLOW_THRESHOLD_MS: i32 = 2000;
const DEFAULT_MAX_CONCURRENT_PROBES: usize = 8;

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let file_config = match config_path {
            Some(path) => read_config_file(path)?,
            None => PartialAppConfig::default(),
        };
        let env_config = PartialAppConfig::from_env()?;
        merge(env_config, file_config)
    }
}

fn read_config_file(path_str: &str) -> Result<PartialAppConfig, ConfigError> {
    let path = Path::new(path_str);
    if !path.exists() {
        return Ok(PartialAppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path_str.to_string(),
        source: e,
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path_str.to_string(),
        source: e,
    })
}

impl PartialAppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(PartialAppConfig {
            database_url: std::env::var("DATABASE_URL").ok(),
            log_dir: std::env::var("LOG_DIR").ok(),
            scheduler_interval_seconds: parse_env("SCHEDULER_INTERVAL_SECONDS")?,
            slow_threshold_ms: parse_env("SLOW_THRESHOLD_MS")?,
            max_concurrent_probes: parse_env("MAX_CONCURRENT_PROBES")?,
        })
    }
}

fn parse_env<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvValue { name, value: raw }),
        Err(_) => Ok(None),
    }
}

// Environment overrides file; defaults fill the rest.
fn merge(env: PartialAppConfig, file: PartialAppConfig) -> Result<AppConfig, ConfigError> {
    Ok(AppConfig {
        database_url: env
            .database_url
            .or(file.database_url)
            .ok_or(ConfigError::MissingDatabaseUrl)?,
        log_dir: env.log_dir.or(file.log_dir).unwrap_or_else(default_log_dir),
        scheduler_interval_seconds: env
            .scheduler_interval_seconds
            .or(file.scheduler_interval_seconds)
            .unwrap_or(DEFAULT_SCHEDULER_INTERVAL_SECONDS),
        slow_threshold_ms: env
            .slow_threshold_ms
            .or(file.slow_threshold_ms)
            .unwrap_or(DEFAULT_SLOW_THRESHOLD_MS),
        max_concurrent_probes: env
            .max_concurrent_probes
            .or(file.max_concurrent_probes)
            .unwrap_or(DEFAULT_MAX_CONCURRENT_PROBES),
    })
}
