use crate::record::{Level, LogRecord};
use std::error::Error;

/// Destination for [`LogRecord`]s produced by a [`crate::logger::Logger`].
///
/// Implementations write records to a concrete output (console, rotating
/// files, memory). Calls happen synchronously on the logging thread, so
/// implementations should keep `send` cheap and do their own locking.
pub trait LogSink: Send + Sync {
    /// Write a single record.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was written.
    /// - `Err(..)` if the output failed (I/O, encoding). The logger reports
    ///   the failure to stderr and carries on; callers of the log methods
    ///   never observe it.
    fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered output.
    ///
    /// Default implementation is a no-op.
    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// Fan a record out to several sinks, each with its own minimum level.
///
/// This is how the file output sends everything from `info` up to one
/// file and only errors to a second one.
pub struct TeeSink {
    branches: Vec<(Level, Box<dyn LogSink>)>,
}

impl TeeSink {
    pub fn new() -> Self {
        TeeSink {
            branches: Vec::new(),
        }
    }

    pub fn with_branch(mut self, min_level: Level, sink: impl LogSink + 'static) -> Self {
        self.branches.push((min_level, Box::new(sink)));
        self
    }
}

impl Default for TeeSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for TeeSink {
    fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut last_err = None;
        for (min_level, sink) in &self.branches {
            if record.level < *min_level {
                continue;
            }
            if let Err(e) = sink.send(record) {
                last_err = Some(e);
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut last_err = None;
        for (_, sink) in &self.branches {
            if let Err(e) = sink.flush() {
                last_err = Some(e);
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
