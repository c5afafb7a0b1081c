/// Error returned when a logger cannot be built from configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unrecognized log level: {0:?}")]
    InvalidLevel(String),

    #[error("unrecognized output mode: {0:?} (expected \"file\" or \"console\")")]
    InvalidOutputMode(String),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to prepare log output {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Error produced by a single webhook delivery attempt.
///
/// These never reach the caller of the notifier; they are logged and
/// count as a failed attempt.
#[cfg(feature = "alarm")]
#[derive(thiserror::Error, Debug)]
pub enum AlarmError {
    #[error("encode alarm payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("create http request: {0}")]
    Build(String),

    #[error("send http request: {0}")]
    Send(String),

    #[error("read response body: {0}")]
    ReadBody(String),

    #[error("response code != 200, code: {status}, body: {body}")]
    Status { status: u16, body: String },
}
