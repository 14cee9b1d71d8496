//! Structured logging for the command router.
//!
//! Console plus rolling NDJSON file output, and redaction of user text
//! before it reaches the logs.

pub mod logger;
pub mod redact;

pub use logger::{init_logger, LogOptions};
pub use redact::{redact_sensitive_data, truncate_for_log};
