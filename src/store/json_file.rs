//! JSON file record store
//!
//! The whole document is rewritten on every change. Writes go to a temporary
//! sibling file that is renamed over the store, so a failed write leaves the
//! previous contents in place.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::LogEntry;
use crate::error::StoreError;

use super::{evict_before, evict_oldest, sort_oldest_first, LogRecord, LogStore, RecordId};

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    /// Last id handed out; never reused after deletes
    #[serde(default)]
    last_id: RecordId,
    #[serde(default)]
    records: Vec<LogRecord>,
}

/// Store for persisting log records to a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    store_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
        }
    }

    /// Get the path to the store file
    pub fn path(&self) -> &Path {
        &self.store_path
    }

    fn load(&self) -> Result<StoreDocument, StoreError> {
        if !self.store_path.exists() {
            return Ok(StoreDocument::default());
        }

        let content = fs::read_to_string(&self.store_path)?;
        if content.trim().is_empty() {
            return Ok(StoreDocument::default());
        }

        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, document: &StoreDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.store_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(document)?;
        replace_file(&self.store_path, &content)
    }

    /// Load, apply `change`, and save only if something changed
    fn modify<T>(
        &self,
        change: impl FnOnce(&mut StoreDocument) -> (T, bool),
    ) -> Result<T, StoreError> {
        let mut document = self.load()?;
        let (result, changed) = change(&mut document);
        if changed {
            self.save(&document)?;
        }
        Ok(result)
    }
}

/// Write `content` to a temporary sibling and rename it over `path`
///
/// The temporary file is removed if either step fails.
fn replace_file(path: &Path, content: &str) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("json.tmp");
    let written = fs::write(&tmp_path, content).and_then(|()| fs::rename(&tmp_path, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

impl LogStore for JsonFileStore {
    fn insert_one(&mut self, entry: &LogEntry) -> Result<RecordId, StoreError> {
        self.modify(|document| {
            document.last_id += 1;
            let id = document.last_id;
            document.records.push(LogRecord::from_entry(id, entry));
            (id, true)
        })
    }

    fn insert_batch(&mut self, entries: &[LogEntry]) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }

        self.modify(|document| {
            for entry in entries {
                document.last_id += 1;
                let id = document.last_id;
                document.records.push(LogRecord::from_entry(id, entry));
            }
            ((), true)
        })
    }

    fn count_all(&self) -> Result<usize, StoreError> {
        Ok(self.load()?.records.len())
    }

    fn delete_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        self.modify(|document| {
            let deleted = evict_before(&mut document.records, cutoff);
            (deleted, deleted > 0)
        })
    }

    fn delete_oldest(&mut self, n: usize) -> Result<usize, StoreError> {
        self.modify(|document| {
            let deleted = evict_oldest(&mut document.records, n);
            (deleted, deleted > 0)
        })
    }

    fn records(&self) -> Result<Vec<LogRecord>, StoreError> {
        let mut records = self.load()?.records;
        sort_oldest_first(&mut records);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Severity;
    use chrono::Duration;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> JsonFileStore {
        JsonFileStore::new(temp_dir.path().join("logs.json"))
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        assert_eq!(store.count_all().unwrap(), 0);
        assert!(store.records().unwrap().is_empty());
    }

    #[test]
    fn test_insert_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        let entry = LogEntry::build(Severity::Error, "Importer", "run", "failed", None);
        let id = store.insert_one(&entry).unwrap();
        store
            .insert_batch(&[
                LogEntry::build(Severity::Info, "Importer", "run", "a", None),
                LogEntry::build(Severity::Info, "Importer", "run", "b", None),
            ])
            .unwrap();

        let reopened = test_store(&temp_dir);
        let records = reopened.records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].message, "failed");
        assert_eq!(records[2].message, "b");
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        let entry = LogEntry::build(Severity::Info, "A", "b", "m", None);

        store.insert_one(&entry).unwrap();
        store.insert_one(&entry).unwrap();
        assert_eq!(store.delete_before(Utc::now()).unwrap(), 2);

        assert_eq!(store.insert_one(&entry).unwrap(), 3);
    }

    #[test]
    fn test_delete_before_keeps_newer() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        let now = Utc::now();

        let old = LogEntry::build_at(Severity::Info, "A", "b", "old", None, now - Duration::days(3));
        let new = LogEntry::build_at(Severity::Info, "A", "b", "new", None, now);
        store.insert_batch(&[old, new]).unwrap();

        assert_eq!(store.delete_before(now - Duration::days(1)).unwrap(), 1);
        let records = store.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "new");
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("logs.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "kept").unwrap();

        assert!(matches!(
            replace_file(&target, "{}"),
            Err(StoreError::Io(_))
        ));
        assert!(!temp_dir.path().join("logs.json.tmp").exists());
        assert_eq!(fs::read_to_string(target.join("keep")).unwrap(), "kept");
    }

    #[test]
    fn test_failed_write_keeps_previous_contents() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        let entry = LogEntry::build(Severity::Info, "A", "b", "first", None);
        store.insert_one(&entry).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        // A directory in the temp file's place makes the write fail
        fs::create_dir(temp_dir.path().join("logs.json.tmp")).unwrap();
        let second = LogEntry::build(Severity::Info, "A", "b", "second", None);
        assert!(store.insert_one(&second).is_err());

        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
        let records = store.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "first");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(
            store.count_all(),
            Err(StoreError::Serialization(_))
        ));
    }
}
