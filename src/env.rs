/// Environment variable names read by [`crate::config::LoggerConfig::from_env`].
///
/// These are purely helpers; the logger itself never reads the
/// environment.

/// Minimum level: `debug`, `info`, `warn`, `error`, `panic`, `fatal`.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Output mode: `file` or `console`.
pub const LOG_OUT_TYPE_ENV: &str = "LOG_OUT_TYPE";

/// Directory for `<date>-info.log` / `<date>-error.log`.
pub const LOG_FILE_PATH_ENV: &str = "LOG_FILE_PATH";

/// Maximum size of one log file in megabytes.
pub const LOG_MAX_SIZE_ENV: &str = "LOG_MAX_SIZE";

/// Maximum number of rotated files to keep.
pub const LOG_MAX_BACKUPS_ENV: &str = "LOG_MAX_BACKUPS";

/// Maximum age of rotated files in days.
pub const LOG_MAX_AGE_ENV: &str = "LOG_MAX_AGE";

/// Whether to gzip rotated files (`true`/`false`).
pub const LOG_COMPRESS_ENV: &str = "LOG_COMPRESS";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
