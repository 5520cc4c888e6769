//! Exceptions attached to log entries and the cause-chain formatter

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;

/// An error with a type name, message, stack trace and optional cause
pub trait Exception {
    /// Name of the error type, used as the block header
    fn type_name(&self) -> &str;

    fn message(&self) -> &str;

    /// Stack trace text captured with the error, empty if none was captured
    fn stack_trace(&self) -> &str;

    /// The underlying exception that caused this one
    fn caused_by(&self) -> Option<&dyn Exception>;
}

/// Longest cause chain rendered or captured
pub const MAX_CHAIN_DEPTH: usize = 64;

/// Same object: same address and same concrete type
///
/// A cause stored at offset 0 of its wrapper shares the wrapper's address, so
/// the address alone does not identify an exception.
fn same_exception(a: &dyn Exception, b: &dyn Exception) -> bool {
    let same_address = std::ptr::eq(a as *const _ as *const (), b as *const _ as *const ());
    std::ptr::eq(a, b) || (same_address && a.type_name() == b.type_name())
}

/// Render a cause chain, outermost exception first
///
/// Each exception contributes `"<TypeName>: <Message>\n<StackTraceText>\n\n"`.
/// An exception seen earlier in the chain ends the walk, as does reaching
/// [`MAX_CHAIN_DEPTH`].
pub fn format_exception_chain(exception: Option<&dyn Exception>) -> String {
    let mut text = String::new();
    let mut visited: Vec<&dyn Exception> = Vec::new();
    let mut current = exception;

    while let Some(exception) = current {
        if visited.len() >= MAX_CHAIN_DEPTH
            || visited.iter().any(|seen| same_exception(*seen, exception))
        {
            break;
        }
        visited.push(exception);

        text.push_str(exception.type_name());
        text.push_str(": ");
        text.push_str(exception.message());
        text.push('\n');
        text.push_str(exception.stack_trace());
        text.push_str("\n\n");

        current = exception.caused_by();
    }

    text
}

/// Owned exception record, built by hand or captured from a `std::error::Error`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    type_name: String,
    message: String,
    stack_trace: String,
    cause: Option<Box<CapturedError>>,
}

impl CapturedError {
    /// Create an exception with no stack trace and no cause
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            stack_trace: String::new(),
            cause: None,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = stack_trace.into();
        self
    }

    pub fn with_cause(mut self, cause: CapturedError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Capture `err` and its `source()` chain
    ///
    /// The outer record carries a backtrace when `RUST_BACKTRACE` or
    /// `RUST_LIB_BACKTRACE` enables capturing.
    pub fn capture<E: StdError + 'static>(err: &E) -> Self {
        let backtrace = Backtrace::capture();
        let stack_trace = match backtrace.status() {
            BacktraceStatus::Captured => backtrace.to_string(),
            _ => String::new(),
        };

        let outer: *const (dyn StdError + 'static) = err;
        let mut visited = vec![outer];

        Self {
            type_name: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            stack_trace,
            cause: capture_source(err.source(), &mut visited).map(Box::new),
        }
    }
}

/// Convert a `source()` chain, stopping at an error already converted
fn capture_source(
    source: Option<&(dyn StdError + 'static)>,
    visited: &mut Vec<*const (dyn StdError + 'static)>,
) -> Option<CapturedError> {
    let source = source?;
    if visited.len() >= MAX_CHAIN_DEPTH
        || visited.iter().any(|seen| std::ptr::eq(*seen, source))
    {
        return None;
    }
    visited.push(source);
    if let Some(captured) = source.downcast_ref::<CapturedError>() {
        return Some(captured.clone());
    }

    Some(CapturedError {
        type_name: source_type_name(source).to_string(),
        message: source.to_string(),
        stack_trace: String::new(),
        cause: capture_source(source.source(), visited).map(Box::new),
    })
}

/// Best-effort type name for an error only known as `dyn Error`
fn source_type_name(source: &(dyn StdError + 'static)) -> &'static str {
    if source.is::<std::io::Error>() {
        "std::io::Error"
    } else if source.is::<fmt::Error>() {
        "core::fmt::Error"
    } else if source.is::<std::num::ParseIntError>() {
        "core::num::error::ParseIntError"
    } else if source.is::<serde_json::Error>() {
        "serde_json::error::Error"
    } else {
        "Error"
    }
}

impl Exception for CapturedError {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn stack_trace(&self) -> &str {
        &self.stack_trace
    }

    fn caused_by(&self) -> Option<&dyn Exception> {
        self.cause.as_deref().map(|c| c as &dyn Exception)
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

impl StdError for CapturedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn StdError + 'static))
    }
}
