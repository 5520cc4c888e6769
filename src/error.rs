//! Error types for applog

use thiserror::Error;

/// Errors raised by a [`LogStore`](crate::store::LogStore) implementation
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Records could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Main error type for logging operations
#[derive(Error, Debug)]
pub enum LogError {
    /// Persistence failed; the store's error is passed through as-is
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Formatting the message arguments failed
    #[error("Format error: {0}")]
    Format(#[from] std::fmt::Error),

    /// The API was used in a way its contract forbids
    #[error("Illegal usage: {0}")]
    IllegalUsage(String),

    /// Configuration could not be loaded or parsed
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias for logging operations
pub type Result<T> = std::result::Result<T, LogError>;
