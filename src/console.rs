use crate::record::LogRecord;
use crate::sink::LogSink;
use std::error::Error;
use std::io::Write;

/// Writes each record as one JSON line to standard output.
///
/// The stdout lock is held for the whole line so concurrent loggers never
/// interleave partial records.
#[derive(Clone, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        let line = record.to_json_line();
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        out.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        std::io::stdout().lock().flush()?;
        Ok(())
    }
}
