//! Context-aware structured logging for game servers.
//!
//! [`ContextLogger`] is a leveled logging facade whose field chaining never
//! mutates the receiver. Request context from the host framework is
//! attached with [`Attach::Context`], a type-erased [`Attach::Opaque`] or
//! [`ContextLogger::with_context`], and expands into a fixed set of request
//! fields (see [`context`]).
//!
//! With the `alarm` feature, [`alarm::AlarmNotifier`] posts markdown alerts
//! to a webhook with bounded retries.

pub mod record;
pub mod error;
pub mod sink;
pub mod console;
pub mod noop_sink;
pub mod capture;
pub mod rotation;
pub mod logger;
pub mod context;
pub mod facade;
pub mod layer;

pub mod env;
pub mod config;
pub mod init;

#[cfg(feature = "alarm")]
pub mod alarm;

pub use config::{LoggerConfig, OutputMode};
pub use context::{PropagatedContext, RequestContext, Session, SessionData, StaticSession};
pub use error::ConfigError;
pub use facade::{Attach, ContextLogger};
pub use init::{build_logger, close, global, init_global};
pub use logger::Logger;
pub use record::{Field, Level, LogRecord};
