use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::env::{
    env_or, LOG_COMPRESS_ENV, LOG_FILE_PATH_ENV, LOG_LEVEL_ENV, LOG_MAX_AGE_ENV,
    LOG_MAX_BACKUPS_ENV, LOG_MAX_SIZE_ENV, LOG_OUT_TYPE_ENV,
};
use crate::error::ConfigError;
use crate::rotation::RotationPolicy;

/// Where records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Console,
    File,
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(OutputMode::File),
            "" | "console" | "stdout" => Ok(OutputMode::Console),
            _ => Err(ConfigError::InvalidOutputMode(s.to_string())),
        }
    }
}

/// Settings handed to [`crate::init::build_logger`].
///
/// The level stays a string until the logger is built so that a bad value
/// surfaces as [`ConfigError::InvalidLevel`] at initialization.
///
/// **Fields**
/// - `level`: minimum severity name.
/// - `out_type`: console or rotating files.
/// - `file_path`: directory for the file pair; a trailing `/` is ignored.
/// - `max_size_mb`: rotate a file once it reaches this size (0 → 100 MB).
/// - `max_backups`: rotated files to keep per log (0 → all).
/// - `max_age_days`: delete rotated files older than this (0 → never).
/// - `compress`: gzip rotated files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    pub level: String,
    pub out_type: OutputMode,
    pub file_path: String,
    #[serde(alias = "maxSize")]
    pub max_size_mb: u64,
    pub max_backups: usize,
    #[serde(alias = "maxAge")]
    pub max_age_days: u64,
    pub compress: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            level: "info".to_string(),
            out_type: OutputMode::Console,
            file_path: "logs".to_string(),
            max_size_mb: 100,
            max_backups: 10,
            max_age_days: 30,
            compress: false,
        }
    }
}

impl LoggerConfig {
    /// Read the configuration from `LOG_*` environment variables, using
    /// [`LoggerConfig::default`] for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = LoggerConfig::default();
        Ok(LoggerConfig {
            level: env_or(LOG_LEVEL_ENV, &defaults.level),
            out_type: env_or(LOG_OUT_TYPE_ENV, "console").parse()?,
            file_path: env_or(LOG_FILE_PATH_ENV, &defaults.file_path),
            max_size_mb: parse_env(LOG_MAX_SIZE_ENV, defaults.max_size_mb)?,
            max_backups: parse_env(LOG_MAX_BACKUPS_ENV, defaults.max_backups)?,
            max_age_days: parse_env(LOG_MAX_AGE_ENV, defaults.max_age_days)?,
            compress: parse_env(LOG_COMPRESS_ENV, defaults.compress)?,
        })
    }

    /// Output directory with any trailing separator removed.
    pub fn file_dir(&self) -> PathBuf {
        let trimmed = self.file_path.trim_end_matches('/');
        if trimmed.is_empty() && !self.file_path.is_empty() {
            PathBuf::from("/")
        } else if trimmed.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(trimmed)
        }
    }

    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy::new(
            self.max_size_mb,
            self.max_backups,
            self.max_age_days,
            self.compress,
        )
    }
}

fn parse_env<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(default),
    }
}
