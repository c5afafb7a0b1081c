use crate::config::{LoggerConfig, OutputMode};
use crate::console::ConsoleSink;
use crate::error::ConfigError;
use crate::facade::ContextLogger;
use crate::logger::Logger;
use crate::record::Level;
use crate::rotation::RollingFile;
use crate::sink::TeeSink;
use chrono::Local;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

static GLOBAL: OnceLock<ContextLogger> = OnceLock::new();

/// Build a [`Logger`] from configuration.
///
/// **Behavior**
/// - `console`: JSON lines to stdout from the configured level up.
/// - `file`: two rotating files in the configured directory,
///   `<YYYY-MM-DD>-info.log` (records from `info` up) and
///   `<YYYY-MM-DD>-error.log` (records from `error` up). The configured
///   level still applies in front of both.
///
/// **Returns**
/// - `Err(ConfigError::InvalidLevel)` for an unknown level name.
/// - `Err(ConfigError::Io)` if the directory or files cannot be created.
pub fn build_logger(config: &LoggerConfig) -> Result<Logger, ConfigError> {
    let level: Level = config.level.parse()?;

    match config.out_type {
        OutputMode::Console => Ok(Logger::new(Arc::new(ConsoleSink), level)),
        OutputMode::File => {
            let dir = config.file_dir();
            let date = Local::now().format("%Y-%m-%d").to_string();

            let info = open_rolling(dir.join(format!("{}-info.log", date)), config)?;
            let error = open_rolling(dir.join(format!("{}-error.log", date)), config)?;
            let tee = TeeSink::new()
                .with_branch(Level::Info, info)
                .with_branch(Level::Error, error);

            Ok(Logger::new(Arc::new(tee), level))
        }
    }
}

fn open_rolling(path: PathBuf, config: &LoggerConfig) -> Result<RollingFile, ConfigError> {
    RollingFile::open(&path, config.rotation_policy()).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Initialize the process-wide logger once and return it.
///
/// Concurrent callers block until the first initialization finishes and
/// all receive the same logger; the configuration passed by later calls
/// is ignored.
///
/// # Panics
///
/// If the first call's configuration cannot be turned into a logger. A
/// process has no safe way to continue without one.
pub fn init_global(config: &LoggerConfig) -> ContextLogger {
    GLOBAL
        .get_or_init(|| match build_logger(config) {
            Ok(logger) => ContextLogger::new(logger),
            Err(e) => panic!("failed to initialize logger: {}", e),
        })
        .clone()
}

/// The process-wide logger, if [`init_global`] has run.
pub fn global() -> Option<ContextLogger> {
    GLOBAL.get().cloned()
}

/// Flush the process-wide logger, if any. Call before exiting.
pub fn close() {
    if let Some(logger) = GLOBAL.get() {
        logger.inner().flush();
    }
}
