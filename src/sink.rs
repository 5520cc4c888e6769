//! Immediate or buffered persistence of log entries
//!
//! In immediate mode every entry is written as it is saved. In buffered mode
//! entries queue up in memory until [`LogSink::flush`] writes them as one batch.

use crate::entry::LogEntry;
use crate::error::Result;
use crate::store::LogStore;

/// Owns the store and the pending-entry buffer
///
/// Not synchronized: mutation needs `&mut self`, so sharing a sink across
/// threads requires an outer lock.
#[derive(Debug)]
pub struct LogSink<S: LogStore> {
    store: S,
    /// Whether saves are deferred until flush
    buffered: bool,
    /// Entries saved since the last successful flush, in call order
    pending: Vec<LogEntry>,
}

impl<S: LogStore> LogSink<S> {
    pub fn new(store: S, buffered: bool) -> Self {
        Self {
            store,
            buffered,
            pending: Vec::new(),
        }
    }

    /// Persist `entry` now, or queue it when buffering
    pub fn save(&mut self, entry: LogEntry) -> Result<()> {
        if self.buffered {
            self.pending.push(entry);
        } else {
            self.store.insert_one(&entry)?;
        }
        Ok(())
    }

    /// Write all pending entries as one batch and clear the buffer
    ///
    /// Returns the number of entries written. Does nothing when buffering is
    /// off or nothing is pending. If the write fails the buffer is kept so the
    /// flush can be retried.
    pub fn flush(&mut self) -> Result<usize> {
        if !self.buffered || self.pending.is_empty() {
            return Ok(0);
        }

        self.store.insert_batch(&self.pending)?;
        let flushed = self.pending.len();
        self.pending.clear();

        tracing::debug!("Flushed {} buffered log entries", flushed);
        Ok(flushed)
    }

    /// Switch between buffered and immediate mode
    ///
    /// Never flushes. Entries still pending after buffering is turned off
    /// stay queued until buffering is turned back on and flushed.
    pub fn set_buffered(&mut self, buffered: bool) {
        if !buffered && !self.pending.is_empty() {
            tracing::debug!(
                "Buffering disabled with {} entries pending",
                self.pending.len()
            );
        }
        self.buffered = buffered;
    }

    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    /// Entries waiting for the next flush
    pub fn pending(&self) -> &[LogEntry] {
        &self.pending
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

impl<S: LogStore> Drop for LogSink<S> {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            tracing::warn!(
                "Dropping log sink with {} unflushed entries",
                self.pending.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Severity;
    use crate::error::{LogError, StoreError};
    use crate::test_support::RecordingStore;

    fn entry(message: &str) -> LogEntry {
        LogEntry::build(Severity::Info, "Worker", "run", message, None)
    }

    #[test]
    fn test_unbuffered_save_writes_immediately() {
        let mut sink = LogSink::new(RecordingStore::new(), false);

        sink.save(entry("one")).unwrap();
        assert_eq!(sink.store().insert_one_calls, 1);
        sink.save(entry("two")).unwrap();
        assert_eq!(sink.store().insert_one_calls, 2);

        assert!(sink.store().batch_sizes.is_empty());
        assert_eq!(sink.pending_len(), 0);
    }

    #[test]
    fn test_buffered_saves_then_one_batch() {
        let mut sink = LogSink::new(RecordingStore::new(), true);

        for i in 0..5 {
            sink.save(entry(&format!("msg {}", i))).unwrap();
        }
        assert_eq!(sink.store().write_calls(), 0);
        assert_eq!(sink.pending_len(), 5);

        assert_eq!(sink.flush().unwrap(), 5);

        assert_eq!(sink.store().batch_sizes, vec![5]);
        assert_eq!(sink.store().insert_one_calls, 0);
        let messages: Vec<String> = sink
            .store()
            .records()
            .unwrap()
            .into_iter()
            .map(|r| r.message)
            .collect();
        assert_eq!(messages, vec!["msg 0", "msg 1", "msg 2", "msg 3", "msg 4"]);
        assert_eq!(sink.pending_len(), 0);
    }

    #[test]
    fn test_second_flush_is_noop() {
        let mut sink = LogSink::new(RecordingStore::new(), true);
        sink.save(entry("one")).unwrap();

        assert_eq!(sink.flush().unwrap(), 1);
        assert_eq!(sink.flush().unwrap(), 0);

        assert_eq!(sink.store().batch_sizes, vec![1]);
    }

    #[test]
    fn test_flush_empty_buffer_is_noop() {
        let mut sink = LogSink::new(RecordingStore::new(), true);
        assert_eq!(sink.flush().unwrap(), 0);
        assert_eq!(sink.store().write_calls(), 0);
    }

    #[test]
    fn test_flush_unbuffered_is_noop() {
        let mut sink = LogSink::new(RecordingStore::new(), false);
        sink.save(entry("one")).unwrap();

        assert_eq!(sink.flush().unwrap(), 0);
        assert!(sink.store().batch_sizes.is_empty());
    }

    #[test]
    fn test_failed_flush_keeps_buffer() {
        let mut sink = LogSink::new(RecordingStore::new(), true);
        sink.save(entry("one")).unwrap();
        sink.save(entry("two")).unwrap();

        sink.store_mut().fail_writes = true;
        let err = sink.flush().unwrap_err();
        assert!(matches!(err, LogError::Store(StoreError::Unavailable(_))));
        assert_eq!(sink.pending_len(), 2);
        assert_eq!(sink.store().count_all().unwrap(), 0);

        sink.store_mut().fail_writes = false;
        assert_eq!(sink.flush().unwrap(), 2);
        assert_eq!(sink.pending_len(), 0);
        assert_eq!(sink.store().count_all().unwrap(), 2);
    }

    #[test]
    fn test_unbuffered_save_propagates_store_error() {
        let mut store = RecordingStore::new();
        store.fail_writes = true;
        let mut sink = LogSink::new(store, false);

        assert!(sink.save(entry("one")).is_err());
        assert_eq!(sink.pending_len(), 0);
    }

    #[test]
    fn test_set_buffered_does_not_flush() {
        let mut sink = LogSink::new(RecordingStore::new(), true);
        sink.save(entry("queued")).unwrap();

        sink.set_buffered(false);
        assert!(!sink.is_buffered());
        assert_eq!(sink.pending_len(), 1);
        assert_eq!(sink.flush().unwrap(), 0);

        sink.save(entry("direct")).unwrap();
        assert_eq!(sink.store().insert_one_calls, 1);

        sink.set_buffered(true);
        assert_eq!(sink.flush().unwrap(), 1);
        assert_eq!(sink.store().batch_sizes, vec![1]);
        assert_eq!(sink.pending()[..].len(), 0);
    }
}
