//! Shared utilities for the cooperative governance engine.

pub mod logging;
pub mod time;
pub mod tracing_spans;

pub use logging::{init_logging, LogFormat, LoggingError};
pub use time::format_duration;
