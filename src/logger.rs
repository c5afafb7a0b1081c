use crate::console::ConsoleSink;
use crate::noop_sink::NoopSink;
use crate::record::{Field, Level, LogRecord};
use crate::sink::LogSink;
use std::fmt;
use std::sync::Arc;

/// The structured logger the facade is built on.
///
/// A `Logger` is a sink, a minimum level and the fields accumulated so
/// far. Deriving a logger with [`Logger::with_fields`] copies the field
/// list into a new instance and shares the sink; the receiver is never
/// touched, so loggers can be cloned and handed across threads freely.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    min_level: Level,
    fields: Arc<[Field]>,
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>, min_level: Level) -> Self {
        Logger {
            sink,
            min_level,
            fields: Arc::from(Vec::new()),
        }
    }

    /// Zero-config logger: JSON lines to stdout, everything from `debug` up.
    pub fn example() -> Self {
        Logger::new(Arc::new(ConsoleSink), Level::Debug)
    }

    /// A logger that discards everything.
    pub fn noop() -> Self {
        Logger::new(Arc::new(NoopSink), Level::Fatal)
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    /// Fields every record from this logger carries, in attachment order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// Whether a record at `level` would be written.
    ///
    /// `panic` and `fatal` are always written so the escalation that
    /// follows them is never silent.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level || level >= Level::Panic
    }

    /// Derive a new logger carrying `fields` after the current ones.
    pub fn with_fields<I>(&self, fields: I) -> Logger
    where
        I: IntoIterator<Item = Field>,
    {
        let mut iter = fields.into_iter().peekable();
        if iter.peek().is_none() {
            return self.clone();
        }
        let merged: Vec<Field> = self.fields.iter().cloned().chain(iter).collect();
        Logger {
            sink: Arc::clone(&self.sink),
            min_level: self.min_level,
            fields: Arc::from(merged),
        }
    }

    pub fn log(&self, level: Level, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        let record = LogRecord::new(level, message, self.fields.to_vec());
        if let Err(e) = self.sink.send(&record) {
            eprintln!("log sink write failed: {}", e);
        }
    }

    pub fn flush(&self) {
        if let Err(e) = self.sink.flush() {
            eprintln!("log sink flush failed: {}", e);
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::example()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("fields", &self.fields)
            .finish()
    }
}
