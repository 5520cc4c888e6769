//! Logger facade
//!
//! Every entry point reduces to [`Logger::log`]: resolve the caller if it was
//! not given, build the entry, hand it to the sink.

use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::caller::{BacktraceResolver, CallerResolver};
use crate::config::Config;
use crate::entry::{LogEntry, Severity};
use crate::error::{LogError, Result};
use crate::exception::Exception;
use crate::retention::RetentionManager;
use crate::sink::LogSink;
use crate::store::{JsonFileStore, LogStore};

/// Class name under which this type's frames appear in a backtrace
pub(crate) const LOGGER_CLASS: &str = concat!(module_path!(), "::Logger");

static SHARED: OnceLock<Mutex<Logger<JsonFileStore>>> = OnceLock::new();

/// Records entries against the calling function
///
/// Each instance has its own buffer and mode. An instance is not locked
/// internally; use one per thread or wrap it in a `Mutex`.
pub struct Logger<S: LogStore> {
    sink: LogSink<S>,
    resolver: Box<dyn CallerResolver + Send>,
    min_severity: Severity,
}

impl<S: LogStore> Logger<S> {
    /// Create an unbuffered logger that resolves callers from backtraces
    pub fn new(store: S) -> Self {
        Self {
            sink: LogSink::new(store, false),
            resolver: Box::new(BacktraceResolver::new()),
            min_severity: Severity::Debug,
        }
    }

    /// Create a logger with the mode and severity threshold from `config`
    pub fn from_config(store: S, config: &Config) -> Self {
        let mut logger = Self::new(store).with_min_severity(config.min_severity);
        logger.set_buffered(config.buffered);
        logger
    }

    pub fn with_resolver(mut self, resolver: impl CallerResolver + Send + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Discard entries below `severity`
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Record a message against an explicitly named caller
    pub fn log(
        &mut self,
        severity: Severity,
        class_name: &str,
        method_name: &str,
        message: &str,
        exception: Option<&dyn Exception>,
    ) -> Result<()> {
        if severity < self.min_severity {
            return Ok(());
        }

        let entry = LogEntry::build(severity, class_name, method_name, message, exception);
        self.sink.save(entry)
    }

    /// Record a message against the nearest caller outside the logger
    ///
    /// An unresolvable caller is logged with empty class and method names.
    pub fn log_here(
        &mut self,
        severity: Severity,
        message: &str,
        exception: Option<&dyn Exception>,
    ) -> Result<()> {
        if severity < self.min_severity {
            return Ok(());
        }

        let caller = self.resolver.caller();
        self.log(
            severity,
            &caller.class_name,
            &caller.method_name,
            message,
            exception,
        )
    }

    /// Format `args` and record them against the nearest caller
    pub fn log_fmt(
        &mut self,
        severity: Severity,
        exception: Option<&dyn Exception>,
        args: fmt::Arguments<'_>,
    ) -> Result<()> {
        if severity < self.min_severity {
            return Ok(());
        }

        let mut message = String::new();
        fmt::write(&mut message, args)?;
        self.log_here(severity, &message, exception)
    }

    pub fn debug(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.log_fmt(Severity::Debug, None, args)
    }

    pub fn info(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.log_fmt(Severity::Info, None, args)
    }

    pub fn warn(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.log_fmt(Severity::Warn, None, args)
    }

    pub fn error(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.log_fmt(Severity::Error, None, args)
    }

    pub fn warn_with(&mut self, exception: &dyn Exception, args: fmt::Arguments<'_>) -> Result<()> {
        self.log_fmt(Severity::Warn, Some(exception), args)
    }

    pub fn error_with(
        &mut self,
        exception: &dyn Exception,
        args: fmt::Arguments<'_>,
    ) -> Result<()> {
        self.log_fmt(Severity::Error, Some(exception), args)
    }

    /// Write buffered entries as one batch; see [`LogSink::flush`]
    pub fn flush(&mut self) -> Result<usize> {
        self.sink.flush()
    }

    /// Switch buffering on or off without flushing
    pub fn set_buffered(&mut self, buffered: bool) {
        self.sink.set_buffered(buffered);
    }

    pub fn is_buffered(&self) -> bool {
        self.sink.is_buffered()
    }

    /// Number of entries waiting for the next flush
    pub fn pending_len(&self) -> usize {
        self.sink.pending_len()
    }

    pub fn store(&self) -> &S {
        self.sink.store()
    }

    /// Retention operations over this logger's store
    pub fn retention(&mut self) -> RetentionManager<'_, S> {
        RetentionManager::new(self.sink.store_mut())
    }
}

impl Logger<JsonFileStore> {
    /// Install `logger` as the process-wide shared instance
    ///
    /// Must happen before the first call to [`Logger::shared`]; installing
    /// twice is an [`LogError::IllegalUsage`].
    pub fn install_shared(logger: Self) -> Result<()> {
        SHARED
            .set(Mutex::new(logger))
            .map_err(|_| LogError::IllegalUsage("shared logger is already initialized".into()))
    }

    /// The process-wide shared logger
    ///
    /// When nothing was installed, an unbuffered logger over the configured
    /// store is created on first access.
    pub fn shared() -> &'static Mutex<Logger<JsonFileStore>> {
        SHARED.get_or_init(|| {
            let config = Config::load().unwrap_or_else(|e| {
                tracing::warn!("Using default log config: {}", e);
                Config::default()
            });
            let store = JsonFileStore::new(config.store_path.clone());
            Mutex::new(Logger::new(store).with_min_severity(config.min_severity))
        })
    }

    /// Run `f` with exclusive access to the shared logger
    pub fn with_shared<T>(f: impl FnOnce(&mut Logger<JsonFileStore>) -> T) -> T {
        let mut logger = Self::shared()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut logger)
    }
}
