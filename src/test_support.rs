//! Store wrapper that counts calls, for asserting write behaviour in tests

use std::cell::Cell;

use chrono::{DateTime, Utc};

use crate::entry::LogEntry;
use crate::error::StoreError;
use crate::store::{LogRecord, LogStore, MemoryStore, RecordId};

#[derive(Debug, Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub insert_one_calls: usize,
    /// Size of each `insert_batch` call, in order
    pub batch_sizes: Vec<usize>,
    pub count_calls: Cell<usize>,
    pub delete_before_calls: usize,
    pub delete_oldest_calls: Vec<usize>,
    /// Make every write fail with `StoreError::Unavailable`
    pub fail_writes: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_calls(&self) -> usize {
        self.insert_one_calls + self.batch_sizes.len()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes {
            Err(StoreError::Unavailable("writes disabled".into()))
        } else {
            Ok(())
        }
    }
}

impl LogStore for RecordingStore {
    fn insert_one(&mut self, entry: &LogEntry) -> Result<RecordId, StoreError> {
        self.insert_one_calls += 1;
        self.check_writable()?;
        self.inner.insert_one(entry)
    }

    fn insert_batch(&mut self, entries: &[LogEntry]) -> Result<(), StoreError> {
        self.batch_sizes.push(entries.len());
        self.check_writable()?;
        self.inner.insert_batch(entries)
    }

    fn count_all(&self) -> Result<usize, StoreError> {
        self.count_calls.set(self.count_calls.get() + 1);
        self.inner.count_all()
    }

    fn delete_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        self.delete_before_calls += 1;
        self.check_writable()?;
        self.inner.delete_before(cutoff)
    }

    fn delete_oldest(&mut self, n: usize) -> Result<usize, StoreError> {
        self.delete_oldest_calls.push(n);
        self.check_writable()?;
        self.inner.delete_oldest(n)
    }

    fn records(&self) -> Result<Vec<LogRecord>, StoreError> {
        self.inner.records()
    }
}
