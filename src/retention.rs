//! Log record retention management
//!
//! Bounds stored log volume by age and by count, always removing the oldest
//! records first.

use chrono::{DateTime, Utc};

use crate::config::RetentionConfig;
use crate::error::Result;
use crate::store::LogStore;

/// Default retention period in days
pub const DEFAULT_RETENTION_DAYS: u64 = 7;

/// Default cap on stored records
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Outcome of [`RetentionManager::apply`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionReport {
    /// Records removed for being older than the age limit
    pub expired: usize,
    /// Records removed to get under the count limit
    pub trimmed: usize,
}

impl RetentionReport {
    pub fn total(&self) -> usize {
        self.expired + self.trimmed
    }
}

/// Deletes stored records by cutoff time or count limit
///
/// Store errors are returned as-is; nothing is retried. Count-then-delete is
/// two store calls, so another writer between them can leave the store
/// slightly over the limit.
pub struct RetentionManager<'a, S: LogStore> {
    store: &'a mut S,
}

impl<'a, S: LogStore> RetentionManager<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Delete every record created at or before `cutoff`
    ///
    /// Returns the number of records deleted.
    pub fn delete_logs_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize> {
        let deleted = self.store.delete_before(cutoff)?;
        tracing::debug!("Deleted {} log records up to {}", deleted, cutoff);
        Ok(deleted)
    }

    /// Delete every record created up to now
    pub fn delete_all_logs(&mut self) -> Result<usize> {
        self.delete_logs_before(Utc::now())
    }

    /// Delete records older than the specified number of days
    pub fn delete_logs_older_than(&mut self, days: u64) -> Result<usize> {
        self.delete_logs_before(cutoff_for_age(Utc::now(), days))
    }

    /// Trim the store to at most `limit` records, oldest first
    ///
    /// Makes no delete call when the store is already within the limit.
    pub fn delete_logs_to_limit(&mut self, limit: usize) -> Result<usize> {
        let count = self.store.count_all()?;
        if count <= limit {
            return Ok(0);
        }

        let deleted = self.store.delete_oldest(count - limit)?;
        tracing::debug!(
            "Trimmed {} log records to stay within {}",
            deleted,
            limit
        );
        Ok(deleted)
    }

    /// Apply the age limit, then the count limit; a zero limit is skipped
    pub fn apply(&mut self, config: &RetentionConfig) -> Result<RetentionReport> {
        let mut report = RetentionReport::default();
        if config.max_age_days > 0 {
            report.expired = self.delete_logs_older_than(config.max_age_days)?;
        }
        if config.max_entries > 0 {
            report.trimmed = self.delete_logs_to_limit(config.max_entries)?;
        }

        Ok(report)
    }
}

/// `now` minus `days`, saturating at the earliest representable time
fn cutoff_for_age(now: DateTime<Utc>, days: u64) -> DateTime<Utc> {
    i64::try_from(days)
        .ok()
        .and_then(chrono::Duration::try_days)
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
