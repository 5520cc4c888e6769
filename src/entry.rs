//! Log entries and the severity scale
//!
//! A [`LogEntry`] is assembled once per logging call and never changes afterwards.

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::exception::{format_exception_chain, Exception};

/// Human-readable timestamp layout stored next to the machine timestamp
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity of a log entry, ordered by increasing importance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Get the stored name for this severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    severity: Severity,
    class_name: String,
    method_name: String,
    message: String,
    exception_text: String,
    has_exception: bool,
    created_at: DateTime<Utc>,
    created_at_display: String,
}

impl LogEntry {
    /// Build an entry stamped with the current time
    pub fn build(
        severity: Severity,
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        message: impl Into<String>,
        exception: Option<&dyn Exception>,
    ) -> Self {
        Self::build_at(
            severity,
            class_name,
            method_name,
            message,
            exception,
            Utc::now(),
        )
    }

    /// Build an entry stamped with `created_at`
    ///
    /// A blank message with an exception present becomes
    /// `"Exception thrown: <TypeName>"`.
    pub fn build_at(
        severity: Severity,
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        message: impl Into<String>,
        exception: Option<&dyn Exception>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            if let Some(exception) = exception {
                message = format!("Exception thrown: {}", exception.type_name());
            }
        }

        Self {
            severity,
            class_name: class_name.into(),
            method_name: method_name.into(),
            message,
            exception_text: format_exception_chain(exception),
            has_exception: exception.is_some(),
            created_at,
            created_at_display: created_at
                .with_timezone(&Local)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Rendered cause chain, empty when no exception was attached
    pub fn exception_text(&self) -> &str {
        &self.exception_text
    }

    pub fn has_exception(&self) -> bool {
        self.has_exception
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// `created_at` in local time, formatted with [`TIMESTAMP_FORMAT`]
    pub fn created_at_display(&self) -> &str {
        &self.created_at_display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::CapturedError;
    use chrono::{NaiveDateTime, TimeZone};

    #[test]
    fn test_blank_message_with_exception_is_synthesized() {
        let err = CapturedError::new("ParseError", "bad digit");
        let entry = LogEntry::build(Severity::Error, "Worker", "run", "  ", Some(&err));

        assert_eq!(entry.message(), "Exception thrown: ParseError");
        assert!(entry.has_exception());
        assert!(entry.exception_text().starts_with("ParseError: bad digit\n"));
    }

    #[test]
    fn test_blank_message_without_exception_stays_blank() {
        let entry = LogEntry::build(Severity::Info, "Worker", "run", "", None);
        assert_eq!(entry.message(), "");
        assert!(!entry.has_exception());
        assert_eq!(entry.exception_text(), "");
    }

    #[test]
    fn test_explicit_message_is_kept_with_exception() {
        let err = CapturedError::new("IoError", "disk gone");
        let entry = LogEntry::build(Severity::Warn, "Worker", "run", "retrying", Some(&err));
        assert_eq!(entry.message(), "retrying");
        assert!(entry.has_exception());
    }

    #[test]
    fn test_display_timestamp_matches_created_at() {
        let created_at = Utc.with_ymd_and_hms(2026, 1, 21, 14, 30, 45).unwrap();
        let entry = LogEntry::build_at(Severity::Debug, "A", "b", "m", None, created_at);

        assert_eq!(entry.created_at(), created_at);
        let parsed =
            NaiveDateTime::parse_from_str(entry.created_at_display(), TIMESTAMP_FORMAT).unwrap();
        assert_eq!(
            parsed,
            created_at.with_timezone(&Local).naive_local()
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert_eq!(Severity::Warn.to_string(), "WARN");
    }

    #[test]
    fn test_severity_serializes_as_screaming_name() {
        let json = serde_json::to_string(&Severity::Error).unwrap();
        assert_eq!(json, "\"ERROR\"");
    }
}
