//! Formatting macros over the [`Logger`](crate::Logger) convenience methods
//!
//! ```ignore
//! log_info!(logger, "imported {} rows", rows)?;
//! log_error!(logger, exception = &err, "import failed for {}", path.display())?;
//! ```

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debug(::core::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.info(::core::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, exception = $exception:expr, $($arg:tt)+) => {
        $logger.warn_with($exception, ::core::format_args!($($arg)+))
    };
    ($logger:expr, $($arg:tt)+) => {
        $logger.warn(::core::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, exception = $exception:expr, $($arg:tt)+) => {
        $logger.error_with($exception, ::core::format_args!($($arg)+))
    };
    ($logger:expr, $($arg:tt)+) => {
        $logger.error(::core::format_args!($($arg)+))
    };
}
