//! In-memory sink for tests and diagnostics.

use crate::record::LogRecord;
use crate::sink::LogSink;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// A sink that keeps every record in memory.
///
/// Clones share the same buffer, so a test can hand one clone to a
/// [`crate::logger::Logger`] and inspect the other.
#[derive(Clone, Default)]
pub struct CaptureSink {
    records: Arc<Mutex<Vec<LogRecord>>>,
    flushes: Arc<Mutex<usize>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record captured so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    pub fn last(&self) -> Option<LogRecord> {
        self.records.lock().ok().and_then(|r| r.last().cloned())
    }

    /// Check if any captured message contains `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.records
            .lock()
            .map(|r| r.iter().any(|rec| rec.message.contains(text)))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }

    /// How many times `flush` was called.
    pub fn flush_count(&self) -> usize {
        self.flushes.lock().map(|n| *n).unwrap_or(0)
    }
}

impl LogSink for CaptureSink {
    fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.records
            .lock()
            .map_err(|_| "capture buffer poisoned")?
            .push(record.clone());
        Ok(())
    }

    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        *self.flushes.lock().map_err(|_| "capture buffer poisoned")? += 1;
        Ok(())
    }
}
