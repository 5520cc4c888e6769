//! applog - application-side logging with caller resolution
//!
//! Records severity-tagged messages against the function that logged them,
//! persists them immediately or in batches, and trims stored records by age
//! and count.

mod macros;

pub mod caller;
pub mod config;
pub mod entry;
pub mod error;
pub mod exception;
pub mod logger;
pub mod retention;
pub mod sink;
pub mod store;

#[cfg(test)]
mod test_support;

pub use caller::{BacktraceResolver, CallerFrame, CallerResolver, StaticTraceResolver};
pub use config::{Config, RetentionConfig};
pub use entry::{LogEntry, Severity};
pub use error::{LogError, Result, StoreError};
pub use exception::{format_exception_chain, CapturedError, Exception};
pub use logger::Logger;
pub use retention::{RetentionManager, RetentionReport};
pub use sink::LogSink;
pub use store::{JsonFileStore, LogRecord, LogStore, MemoryStore, RecordId};
