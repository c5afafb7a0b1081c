//! Leveled logging facade with immutable field chaining.
//!
//! ```
//! use std::sync::Arc;
//! use ctx_log_bridge::{Attach, ContextLogger, RequestContext, StaticSession};
//! use ctx_log_bridge::context::ROUTE_KEY;
//!
//! let log = ContextLogger::default();
//! let ctx = RequestContext::new()
//!     .with_value(ROUTE_KEY, "room.join")
//!     .with_session(Arc::new(StaticSession::new("u-42")));
//!
//! let req_log = log
//!     .attach(Attach::context(&ctx))
//!     .with_field("room", "lobby");
//! req_log.infof(format_args!("joined after {} ms", 12));
//! ```

use serde_json::Value;
use std::any::Any;
use std::error::Error;
use std::fmt::{self, Display, Write as _};

use crate::context::{as_context, extract_fields, PropagatedContext};
use crate::logger::Logger;
use crate::record::{Field, Level};

/// Field name used by [`ContextLogger::with_error`].
pub const ERROR_KEY: &str = "error";

/// One input to [`ContextLogger::attach`] / [`ContextLogger::attach_many`].
///
/// Request context is its own variant rather than a reserved field name,
/// so a plain field may use any key.
pub enum Attach<'a> {
    /// Attach `value` under `key` as-is.
    Field { key: String, value: Value },
    /// Expand a context into the request fields.
    Context(&'a dyn PropagatedContext),
    /// Expand a type-erased handle into the request fields.
    ///
    /// If the handle is not a recognised context carrier (see
    /// [`crate::context::as_context`]) the entry contributes nothing.
    Opaque(&'a dyn Any),
}

impl<'a> Attach<'a> {
    pub fn field(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Attach::Field {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn context(ctx: &'a dyn PropagatedContext) -> Self {
        Attach::Context(ctx)
    }

    pub fn opaque(handle: &'a dyn Any) -> Self {
        Attach::Opaque(handle)
    }

    /// Fields this entry contributes; `None` for an unrecognised context.
    fn into_fields(self) -> Option<Vec<Field>> {
        match self {
            Attach::Field { key, value } => Some(vec![Field { key, value }]),
            Attach::Context(ctx) => Some(extract_fields(ctx)),
            Attach::Opaque(handle) => as_context(handle).map(extract_fields),
        }
    }
}

impl fmt::Debug for Attach<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attach::Field { key, value } => f
                .debug_struct("Field")
                .field("key", key)
                .field("value", value)
                .finish(),
            Attach::Context(_) => f.write_str("Context(..)"),
            Attach::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

/// Logging facade over a [`Logger`].
///
/// Every `attach`/`with_*` call returns a new instance; the receiver keeps
/// its own fields. Instances are cheap to clone and safe to share.
#[derive(Clone, Debug, Default)]
pub struct ContextLogger {
    logger: Logger,
}

impl ContextLogger {
    pub fn new(logger: Logger) -> Self {
        ContextLogger { logger }
    }

    /// Attach a single entry.
    ///
    /// An unrecognised opaque handle returns a logger equivalent to the
    /// receiver.
    pub fn attach(&self, entry: Attach<'_>) -> ContextLogger {
        match entry.into_fields() {
            Some(fields) => self.derive(fields),
            None => self.clone(),
        }
    }

    /// Attach several entries at once.
    ///
    /// Entries are independent: an unrecognised opaque handle is skipped
    /// and the remaining entries still attach.
    pub fn attach_many<'a, I>(&self, entries: I) -> ContextLogger
    where
        I: IntoIterator<Item = Attach<'a>>,
    {
        let fields: Vec<Field> = entries
            .into_iter()
            .filter_map(Attach::into_fields)
            .flatten()
            .collect();
        self.derive(fields)
    }

    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> ContextLogger {
        self.attach(Attach::field(key, value))
    }

    /// Attach request fields from a typed context.
    pub fn with_context(&self, ctx: &dyn PropagatedContext) -> ContextLogger {
        self.derive(extract_fields(ctx))
    }

    /// Attach `err` under the `error` field.
    pub fn with_error(&self, err: &dyn Error) -> ContextLogger {
        self.with_field(ERROR_KEY, err.to_string())
    }

    /// The wrapped logger, for capabilities this facade does not cover.
    pub fn inner(&self) -> &Logger {
        &self.logger
    }

    pub fn into_inner(self) -> Logger {
        self.logger
    }

    fn derive(&self, fields: Vec<Field>) -> ContextLogger {
        ContextLogger {
            logger: self.logger.with_fields(fields),
        }
    }

    /// Log a pre-formatted message at `level`.
    ///
    /// `panic` and `fatal` escalate after the write; see [`Self::panic`]
    /// and [`Self::fatal`].
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        match level {
            Level::Panic => self.escalate_panic(args.to_string()),
            Level::Fatal => self.escalate_fatal(args.to_string()),
            _ => {
                if self.logger.enabled(level) {
                    self.logger.log(level, args.to_string());
                }
            }
        }
    }

    fn emit_with(&self, level: Level, render: impl FnOnce() -> String) {
        if self.logger.enabled(level) {
            self.logger.log(level, render());
        }
    }

    fn escalate_panic(&self, message: String) -> ! {
        self.logger.log(Level::Panic, message.clone());
        self.logger.flush();
        panic!("{}", message);
    }

    fn escalate_fatal(&self, message: String) -> ! {
        self.logger.log(Level::Fatal, message);
        self.logger.flush();
        std::process::exit(1);
    }
}

/// Operands written back to back.
fn concat(parts: &[&dyn Display]) -> String {
    let mut out = String::new();
    for part in parts {
        let _ = write!(out, "{}", part);
    }
    out
}

/// Operands separated by single spaces. The trailing newline of the
/// line-oriented convention is not stored in the record.
fn join_spaced(parts: &[&dyn Display]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{}", part);
    }
    out
}

macro_rules! leveled {
    ($level:expr, $plain:ident, $formatted:ident, $line:ident) => {
        #[doc = concat!("Log the operands concatenated, at `", stringify!($plain), "`.")]
        pub fn $plain(&self, parts: &[&dyn Display]) {
            self.emit_with($level, || concat(parts));
        }

        #[doc = concat!("Log a `format_args!` message at `", stringify!($plain), "`.")]
        pub fn $formatted(&self, args: fmt::Arguments<'_>) {
            self.emit_with($level, || args.to_string());
        }

        #[doc = concat!("Log the operands separated by spaces, at `", stringify!($plain), "`.")]
        pub fn $line(&self, parts: &[&dyn Display]) {
            self.emit_with($level, || join_spaced(parts));
        }
    };
}

impl ContextLogger {
    leveled!(Level::Debug, debug, debugf, debugln);
    leveled!(Level::Info, info, infof, infoln);
    leveled!(Level::Warn, warn, warnf, warnln);
    leveled!(Level::Error, error, errorf, errorln);

    /// Log at `panic`, flush, then panic with the same message.
    pub fn panic(&self, parts: &[&dyn Display]) -> ! {
        self.escalate_panic(concat(parts))
    }

    pub fn panicf(&self, args: fmt::Arguments<'_>) -> ! {
        self.escalate_panic(args.to_string())
    }

    pub fn panicln(&self, parts: &[&dyn Display]) -> ! {
        self.escalate_panic(join_spaced(parts))
    }

    /// Log at `fatal`, flush, then exit the process with status 1.
    pub fn fatal(&self, parts: &[&dyn Display]) -> ! {
        self.escalate_fatal(concat(parts))
    }

    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.escalate_fatal(args.to_string())
    }

    pub fn fatalln(&self, parts: &[&dyn Display]) -> ! {
        self.escalate_fatal(join_spaced(parts))
    }
}

impl From<Logger> for ContextLogger {
    fn from(logger: Logger) -> Self {
        ContextLogger::new(logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureSink;
    use crate::context::{
        RequestContext, StaticSession, CONTEXT_FIELD_COUNT, REQUEST_ID_KEY, SESSION_UID_KEY,
    };
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Arc;

    fn capture() -> (ContextLogger, CaptureSink) {
        let sink = CaptureSink::new();
        let logger = Logger::new(Arc::new(sink.clone()), Level::Debug);
        (ContextLogger::new(logger), sink)
    }

    #[test]
    fn conventions_produce_the_same_message() {
        let (log, sink) = capture();
        let user = "u-1";
        let gold = 250;

        log.info(&[&"user ", &user, &" spent ", &gold]);
        log.infof(format_args!("user {} spent {}", user, gold));
        log.infoln(&[&"user", &user, &"spent", &gold]);

        let messages = sink.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m == "user u-1 spent 250"));
    }

    #[test]
    fn format_verbs_in_arguments_are_not_reinterpreted() {
        let (log, sink) = capture();
        log.errorf(format_args!("bad input {}", "{} %s %d"));
        assert_eq!(sink.messages(), vec!["bad input {} %s %d"]);
    }

    #[test]
    fn plain_field_is_only_on_the_derived_logger() {
        let (base, sink) = capture();
        let child = base.with_field("room", "lobby");

        child.info(&[&"child"]);
        base.info(&[&"base"]);

        let records = sink.records();
        assert_eq!(records[0].field("room"), Some(&Value::from("lobby")));
        assert_eq!(records[1].field("room"), None);
    }

    #[test]
    fn attach_context_matches_direct_extraction() {
        let (log, sink) = capture();
        let ctx = RequestContext::new()
            .with_value(REQUEST_ID_KEY, "req-5")
            .with_session(Arc::new(StaticSession::new("u-42")));

        log.attach(Attach::context(&ctx)).info(&[&"single"]);
        log.attach_many([Attach::context(&ctx)]).info(&[&"batch"]);
        log.attach(Attach::opaque(&ctx)).info(&[&"erased"]);

        let expected = extract_fields(&ctx);
        let records = sink.records();
        assert_eq!(records[0].fields, expected);
        assert_eq!(records[1].fields, expected);
        assert_eq!(records[2].fields, expected);
        assert_eq!(records[0].field(SESSION_UID_KEY), Some(&Value::from("u-42")));
    }

    #[test]
    fn non_context_handle_returns_equivalent_logger() {
        let (log, sink) = capture();
        let base = log.with_field("zone", 3);
        let same = base.attach(Attach::opaque(&"definitely not a context"));

        assert_eq!(same.inner().fields(), base.inner().fields());
        same.warn(&[&"still logs"]);
        let record = sink.last().unwrap();
        assert_eq!(record.message, "still logs");
        assert_eq!(record.fields.len(), 1);
    }

    #[test]
    fn attach_many_skips_only_the_malformed_entry() {
        let (log, sink) = capture();
        let derived = log.attach_many([
            Attach::opaque(&12_u8),
            Attach::field("shard", "eu-1"),
        ]);

        derived.info(&[&"mixed"]);
        let record = sink.last().unwrap();
        assert_eq!(record.fields, vec![Field::new("shard", "eu-1")]);
    }

    #[test]
    fn attach_many_combines_context_and_plain_fields() {
        let (log, sink) = capture();
        let ctx = RequestContext::new().with_value(REQUEST_ID_KEY, "req-8");
        log.attach_many([Attach::context(&ctx), Attach::field("context", "literal")])
            .debug(&[&"both"]);

        let record = sink.last().unwrap();
        assert_eq!(record.fields.len(), CONTEXT_FIELD_COUNT + 1);
        assert_eq!(record.field("context"), Some(&Value::from("literal")));
        assert_eq!(record.field(REQUEST_ID_KEY), Some(&Value::from("req-8")));
    }

    #[test]
    fn with_error_uses_error_key() {
        let (log, sink) = capture();
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        log.with_error(&err).error(&[&"save failed"]);
        assert_eq!(sink.last().unwrap().field(ERROR_KEY), Some(&Value::from("disk full")));
    }

    #[test]
    fn panic_logs_flushes_then_unwinds() {
        let (log, sink) = capture();
        let result = catch_unwind(AssertUnwindSafe(|| {
            log.panicf(format_args!("invariant broken: {}", 7));
        }));

        let payload = result.unwrap_err();
        assert_eq!(
            payload.downcast_ref::<String>().map(String::as_str),
            Some("invariant broken: 7")
        );
        let record = sink.last().unwrap();
        assert_eq!(record.level, Level::Panic);
        assert_eq!(record.message, "invariant broken: 7");
        assert_eq!(sink.flush_count(), 1);
    }

    #[test]
    fn disabled_levels_are_not_written() {
        let sink = CaptureSink::new();
        let log = ContextLogger::new(Logger::new(Arc::new(sink.clone()), Level::Warn));
        log.debug(&[&"hidden"]);
        log.infof(format_args!("hidden"));
        log.warnln(&[&"shown"]);
        assert_eq!(sink.messages(), vec!["shown"]);
    }
}
