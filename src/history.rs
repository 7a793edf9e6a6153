use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::HistoryError;
use crate::io::write_atomic;
use crate::models::{HistoryEntry, HistoryStats, Outcome};

/// Record of which documents have been processed.
///
/// Consulted before a document is parsed and updated after it has been
/// attempted. Only success entries count as processed, so failed documents
/// are retried on the next run.
pub trait HistoryStore {
    /// All entries in the order they were recorded
    fn entries(&self) -> &[HistoryEntry];

    /// Append an entry and persist it
    fn append(&mut self, entry: HistoryEntry) -> Result<(), HistoryError>;

    /// True iff a success entry exists for the document
    fn has_processed(&self, document_id: &str) -> bool {
        self.entries()
            .iter()
            .any(|e| e.document_id == document_id && e.is_success())
    }

    /// Record an attempt, rejecting a second success for the same document
    fn record(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        if entry.is_success() && self.has_processed(&entry.document_id) {
            return Err(HistoryError::AlreadyProcessed(entry.document_id));
        }
        self.append(entry)
    }

    fn mark_processed(&mut self, document_id: &str, outcome: Outcome) -> Result<(), HistoryError> {
        self.record(HistoryEntry {
            document_id: document_id.to_string(),
            processed_timestamp: Utc::now(),
            outcome,
            run_id: None,
            utterances: None,
            error: None,
        })
    }

    fn stats(&self) -> HistoryStats {
        let entries = self.entries();
        let documents: HashSet<&str> = entries.iter().map(|e| e.document_id.as_str()).collect();
        let successes = entries.iter().filter(|e| e.is_success()).count();
        HistoryStats {
            successes,
            failures: entries.len() - successes,
            documents: documents.len(),
        }
    }
}

/// On-disk shape of the history file
#[derive(Debug, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    entries: Vec<HistoryEntry>,
}

/// History persisted as a JSON file, rewritten atomically on every append
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl JsonHistoryStore {
    /// Load the history at `path`.
    ///
    /// A missing file is an empty history. A file that cannot be parsed is
    /// logged and treated as empty; it is replaced on the next save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HistoryFile>(&content) {
                Ok(file) => file.entries,
                Err(e) => {
                    warn!("Ignoring unreadable history file {:?}: {}", path, e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(HistoryError::Io { path, source }),
        };
        debug!("Loaded {} history entries from {:?}", entries.len(), path);
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let file = HistoryFileRef { entries };
        let json = serde_json::to_vec_pretty(&file)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct HistoryFileRef<'a> {
    entries: &'a [HistoryEntry],
}

impl HistoryStore for JsonHistoryStore {
    fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    fn append(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let mut entries = self.entries.clone();
        entries.push(entry);
        self.save(&entries)?;
        self.entries = entries;
        Ok(())
    }
}

/// History kept in memory only
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Vec<HistoryEntry>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    fn append(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.entries.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_does_not_count_as_processed() {
        let mut store = MemoryHistoryStore::new();
        store
            .record(HistoryEntry::failure("sednica_001", "extraction gap"))
            .unwrap();
        assert!(!store.has_processed("sednica_001"));

        store.record(HistoryEntry::success("sednica_001", 12)).unwrap();
        assert!(store.has_processed("sednica_001"));
    }

    #[test]
    fn test_second_success_is_rejected() {
        let mut store = MemoryHistoryStore::new();
        store.mark_processed("sednica_001", Outcome::Success).unwrap();

        let err = store
            .mark_processed("sednica_001", Outcome::Success)
            .unwrap_err();
        assert!(matches!(err, HistoryError::AlreadyProcessed(id) if id == "sednica_001"));
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn test_stats() {
        let mut store = MemoryHistoryStore::new();
        store.mark_processed("a", Outcome::Failure).unwrap();
        store.mark_processed("a", Outcome::Success).unwrap();
        store.mark_processed("b", Outcome::Failure).unwrap();

        assert_eq!(
            store.stats(),
            HistoryStats {
                successes: 1,
                failures: 2,
                documents: 2,
            }
        );
    }

    #[test]
    fn test_json_store_persists_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = JsonHistoryStore::open(&path).unwrap();
        assert!(store.entries().is_empty());
        store.record(HistoryEntry::success("sednica_001", 3)).unwrap();
        store
            .record(HistoryEntry::failure("sednica_002", "no utterances"))
            .unwrap();

        let reopened = JsonHistoryStore::open(&path).unwrap();
        assert_eq!(reopened.entries(), store.entries());
        assert!(reopened.has_processed("sednica_001"));
        assert!(!reopened.has_processed("sednica_002"));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["entries"][0]["outcome"], "success");
        assert_eq!(raw["entries"][1]["error"], "no utterances");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_corrupt_history_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut store = JsonHistoryStore::open(&path).unwrap();
        assert!(store.entries().is_empty());

        store.mark_processed("sednica_001", Outcome::Success).unwrap();
        assert!(JsonHistoryStore::open(&path).unwrap().has_processed("sednica_001"));
    }
}
