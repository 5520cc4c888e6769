//! Persistence for log records
//!
//! [`LogStore`] is the boundary between the logger and wherever records end up.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::{LogEntry, Severity};
use crate::error::StoreError;

/// Store-assigned identifier, increasing in insertion order
pub type RecordId = u64;

/// A persisted log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: RecordId,
    pub severity: Severity,
    pub class_name: String,
    pub method_name: String,
    pub message: String,
    /// Rendered cause chain, empty when no exception was attached
    #[serde(default)]
    pub exception_text: String,
    pub has_exception: bool,
    pub created_at: DateTime<Utc>,
    /// `created_at` as `yyyy-MM-dd HH:mm:ss` local time
    pub created_at_display: String,
}

impl LogRecord {
    pub fn from_entry(id: RecordId, entry: &LogEntry) -> Self {
        Self {
            id,
            severity: entry.severity(),
            class_name: entry.class_name().to_string(),
            method_name: entry.method_name().to_string(),
            message: entry.message().to_string(),
            exception_text: entry.exception_text().to_string(),
            has_exception: entry.has_exception(),
            created_at: entry.created_at(),
            created_at_display: entry.created_at_display().to_string(),
        }
    }
}

/// Ordered record storage with conditional delete
///
/// Writes are all-or-nothing: a failed `insert_batch` stores none of the batch.
pub trait LogStore {
    /// Persist one entry and return its id
    fn insert_one(&mut self, entry: &LogEntry) -> Result<RecordId, StoreError>;

    /// Persist all entries in order as a single write
    fn insert_batch(&mut self, entries: &[LogEntry]) -> Result<(), StoreError>;

    fn count_all(&self) -> Result<usize, StoreError>;

    /// Delete every record with `created_at <= cutoff`, returning how many went
    fn delete_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Delete the `n` oldest records by `created_at`, then id
    fn delete_oldest(&mut self, n: usize) -> Result<usize, StoreError>;

    /// All records, oldest first
    fn records(&self) -> Result<Vec<LogRecord>, StoreError>;
}

/// Sort records oldest first, insertion id breaking timestamp ties
pub(crate) fn sort_oldest_first(records: &mut [LogRecord]) {
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

/// Remove records at or before `cutoff`
pub(crate) fn evict_before(records: &mut Vec<LogRecord>, cutoff: DateTime<Utc>) -> usize {
    let original_count = records.len();
    records.retain(|r| r.created_at > cutoff);
    original_count - records.len()
}

/// Remove the `n` oldest records
pub(crate) fn evict_oldest(records: &mut Vec<LogRecord>, n: usize) -> usize {
    if n == 0 || records.is_empty() {
        return 0;
    }
    if n >= records.len() {
        let count = records.len();
        records.clear();
        return count;
    }

    let mut by_age: Vec<(DateTime<Utc>, RecordId)> =
        records.iter().map(|r| (r.created_at, r.id)).collect();
    by_age.sort();
    let newest_evicted = by_age[n - 1];

    let original_count = records.len();
    records.retain(|r| (r.created_at, r.id) > newest_evicted);
    original_count - records.len()
}
