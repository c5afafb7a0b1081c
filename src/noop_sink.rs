use crate::record::LogRecord;
use crate::sink::LogSink;
use std::error::Error;

/// A sink that simply drops all records.
///
/// Backs [`crate::logger::Logger::noop`], for code paths that must hold a
/// logger but have nowhere to write.
#[derive(Clone, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn send(&self, _record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
