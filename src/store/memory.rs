//! In-process record store

use chrono::{DateTime, Utc};

use crate::entry::LogEntry;
use crate::error::StoreError;

use super::{evict_before, evict_oldest, sort_oldest_first, LogRecord, LogStore, RecordId};

/// Keeps records in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<LogRecord>,
    next_id: RecordId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }
}

impl LogStore for MemoryStore {
    fn insert_one(&mut self, entry: &LogEntry) -> Result<RecordId, StoreError> {
        let id = self.allocate_id();
        self.records.push(LogRecord::from_entry(id, entry));
        Ok(id)
    }

    fn insert_batch(&mut self, entries: &[LogEntry]) -> Result<(), StoreError> {
        self.records.reserve(entries.len());
        for entry in entries {
            let id = self.allocate_id();
            self.records.push(LogRecord::from_entry(id, entry));
        }
        Ok(())
    }

    fn count_all(&self) -> Result<usize, StoreError> {
        Ok(self.records.len())
    }

    fn delete_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        Ok(evict_before(&mut self.records, cutoff))
    }

    fn delete_oldest(&mut self, n: usize) -> Result<usize, StoreError> {
        Ok(evict_oldest(&mut self.records, n))
    }

    fn records(&self) -> Result<Vec<LogRecord>, StoreError> {
        let mut records = self.records.clone();
        sort_oldest_first(&mut records);
        Ok(records)
    }
}
