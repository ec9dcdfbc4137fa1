//! JSON Lines persistence for captured transactions.
//!
//! [`JsonlTransactionStore`] keeps the in-memory store as the source of truth
//! for reads and mirrors every accepted event to an append-only JSONL file.
//! Opening the store replays the file, so a restart recovers the captures of
//! the previous session.
//!
//! Persisted copies can be sanitized: sensitive header values are redacted and
//! oversized response bodies are dropped. The in-memory copy is never altered.

use super::{AppendOutcome, InMemoryTransactionStore, Snapshot, StoreError, TransactionStore};
use crate::config::InspectorConfig;
use crate::models::Transaction;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Header names whose values are redacted in persisted records.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "api-key",
    "auth-token",
    "x-auth-token",
    "access-token",
    "x-access-token",
];

const REDACTED: &str = "[REDACTED]";

/// How records are written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceOptions {
    /// Redact [`SENSITIVE_HEADERS`] before writing.
    pub sanitize_sensitive_headers: bool,

    /// Response bodies larger than this are not persisted.
    pub max_body_bytes: usize,

    /// Capacity of the in-memory store; `None` for unbounded.
    pub max_transactions: Option<usize>,
}

impl Default for PersistenceOptions {
    fn default() -> Self {
        Self {
            sanitize_sensitive_headers: true,
            max_body_bytes: 1_048_576,
            max_transactions: None,
        }
    }
}

impl From<&InspectorConfig> for PersistenceOptions {
    fn from(config: &InspectorConfig) -> Self {
        Self {
            sanitize_sensitive_headers: config.sanitize_sensitive_headers,
            max_body_bytes: config.max_persisted_body_bytes,
            max_transactions: Some(config.max_transactions),
        }
    }
}

/// Transaction store backed by a JSON Lines file.
#[derive(Debug)]
pub struct JsonlTransactionStore {
    memory: InMemoryTransactionStore,
    path: PathBuf,
    options: PersistenceOptions,
    /// Serializes writers so the file and the memory view change together.
    writer: Mutex<Writer>,
}

#[derive(Debug)]
struct Writer {
    file: File,
    /// Lines currently in the file.
    lines: usize,
}

/// Counters reported by [`JsonlTransactionStore::open`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub lines: usize,
    pub corrupted: usize,
    pub records: usize,
}

impl JsonlTransactionStore {
    /// Opens (or creates) the store at `path` and replays existing records.
    ///
    /// Corrupted lines are skipped with a warning. When the file holds more
    /// lines than live records (completed pairs, evicted or corrupted
    /// entries), it is compacted.
    pub fn open(path: impl Into<PathBuf>, options: PersistenceOptions) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let memory = match options.max_transactions {
            Some(capacity) => InMemoryTransactionStore::with_capacity(capacity),
            None => InMemoryTransactionStore::new(),
        };
        let report = replay(&path, &memory)?;

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let store = Self {
            memory,
            path,
            options,
            writer: Mutex::new(Writer {
                file,
                lines: report.lines,
            }),
        };

        if report.lines > report.records {
            store.compact()?;
        }
        info!(
            "opened transaction store {} ({} records, {} corrupted lines)",
            store.path.display(),
            report.records,
            report.corrupted
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrites the file so it holds exactly one line per live record.
    ///
    /// The new content is written to a temporary file first and renamed over
    /// the old one. Appends also compact once the file holds more than twice
    /// as many lines as there are live records.
    pub fn compact(&self) -> Result<usize, StoreError> {
        let mut writer = self.lock_writer()?;
        self.compact_locked(&mut writer)
    }

    fn compact_locked(&self, writer: &mut Writer) -> Result<usize, StoreError> {
        let snapshot = self.memory.snapshot()?;

        let temp_path = self.path.with_extension("jsonl.tmp");
        let mut temp_file = File::create(&temp_path)?;
        for transaction in &snapshot {
            let prepared = self.prepare(transaction);
            writeln!(temp_file, "{}", serde_json::to_string(&prepared)?)?;
        }
        temp_file.flush()?;
        drop(temp_file);

        fs::rename(&temp_path, &self.path)?;
        writer.file = OpenOptions::new().append(true).open(&self.path)?;
        writer.lines = snapshot.len();

        debug!("compacted {} to {} records", self.path.display(), snapshot.len());
        Ok(snapshot.len())
    }

    /// Copy of `transaction` as it should appear on disk.
    fn prepare(&self, transaction: &Transaction) -> Transaction {
        let mut prepared = transaction.clone();
        if self.options.sanitize_sensitive_headers {
            redact(&mut prepared.request.headers);
            if let Some(response) = prepared.response.as_mut() {
                redact(&mut response.headers);
            }
        }
        if let Some(response) = prepared.response.as_mut() {
            if response.body.len() > self.options.max_body_bytes {
                response.body = Vec::new();
            }
        }
        prepared
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, Writer>, StoreError> {
        self.writer
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl TransactionStore for JsonlTransactionStore {
    fn append(&self, transaction: Transaction) -> Result<AppendOutcome, StoreError> {
        let mut writer = self.lock_writer()?;

        // Appends are serialized by the writer lock, so the classification
        // still holds when the record reaches memory.
        if self.memory.classify(&transaction)? == AppendOutcome::Ignored {
            return Ok(AppendOutcome::Ignored);
        }

        let line = serde_json::to_string(&self.prepare(&transaction))?;
        writeln!(writer.file, "{}", line)?;
        writer.file.flush()?;
        writer.lines += 1;

        let outcome = self.memory.append(transaction)?;

        // Updates and evictions leave dead lines behind.
        let live = self.memory.len()?;
        if writer.lines > 2 * live.max(1) {
            self.compact_locked(&mut writer)?;
        }
        Ok(outcome)
    }

    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        self.memory.snapshot()
    }

    fn get(&self, id: &str) -> Result<Option<Arc<Transaction>>, StoreError> {
        self.memory.get(id)
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        let mut writer = self.lock_writer()?;
        // Memory first: if it cannot be cleared, the file still matches it.
        self.memory.delete_all()?;
        writer.file.set_len(0)?;
        writer.lines = 0;
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        self.memory.len()
    }
}

fn redact(headers: &mut HashMap<String, String>) {
    for (name, value) in headers.iter_mut() {
        if SENSITIVE_HEADERS
            .iter()
            .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
        {
            *value = REDACTED.to_string();
        }
    }
}

/// Loads every valid line of `path` into `memory`.
fn replay(path: &Path, memory: &InMemoryTransactionStore) -> Result<ReplayReport, StoreError> {
    let mut report = ReplayReport::default();
    if !path.exists() {
        return Ok(report);
    }

    let reader = BufReader::new(File::open(path)?);
    for (line_num, line_result) in reader.lines().enumerate() {
        let line = match line_result {
            Ok(line) => line,
            Err(e) => {
                report.corrupted += 1;
                warn!("error reading transaction line {}: {}", line_num + 1, e);
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        report.lines += 1;

        match serde_json::from_str::<Transaction>(&line) {
            Ok(transaction) => {
                memory.append(transaction)?;
            }
            Err(e) => {
                report.corrupted += 1;
                warn!(
                    "skipping corrupted transaction at line {}: {}",
                    line_num + 1,
                    e
                );
            }
        }
    }

    report.records = memory.len()?;
    if report.corrupted > 0 && report.corrupted > report.records {
        warn!(
            "transaction file {} is heavily corrupted ({} corrupted lines, {} records)",
            path.display(),
            report.corrupted,
            report.records
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpMethod, RequestRecord, ResponseRecord, TransactionStatus};
    use tempfile::TempDir;

    fn pending(id: &str) -> Transaction {
        let request = RequestRecord::new(HttpMethod::POST, "https://api.example.com/login")
            .with_header("Authorization", "Bearer secret-token")
            .with_header("Accept", "application/json");
        Transaction::started_at(id, request, chrono::Utc::now())
    }

    fn open(dir: &TempDir) -> JsonlTransactionStore {
        JsonlTransactionStore::open(dir.path().join("traffic.jsonl"), PersistenceOptions::default())
            .unwrap()
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = open(&dir);
            let start = pending("a");
            store.append(start.clone()).unwrap();
            store
                .append(start.complete(ResponseRecord::new(200, "OK")))
                .unwrap();
            store.append(pending("b")).unwrap();
        }

        let store = open(&dir);
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.as_slice()[0].id, "a");
        assert_eq!(snapshot.as_slice()[0].status, TransactionStatus::Completed);
        assert_eq!(snapshot.as_slice()[1].status, TransactionStatus::Pending);
    }

    #[test]
    fn test_reopen_compacts_completed_pairs() {
        let dir = TempDir::new().unwrap();
        {
            let store = open(&dir);
            let start = pending("a");
            store.append(start.clone()).unwrap();
            store
                .append(start.complete(ResponseRecord::new(200, "OK")))
                .unwrap();
        }

        let store = open(&dir);
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_sensitive_headers_are_redacted_on_disk_only() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.append(pending("a")).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(!content.contains("secret-token"));
        assert!(content.contains(REDACTED));

        let in_memory = store.get("a").unwrap().unwrap();
        assert_eq!(
            in_memory.request.header("authorization"),
            Some("Bearer secret-token")
        );
    }

    #[test]
    fn test_large_bodies_are_not_persisted() {
        let dir = TempDir::new().unwrap();
        let options = PersistenceOptions {
            max_body_bytes: 8,
            ..PersistenceOptions::default()
        };
        let path = dir.path().join("traffic.jsonl");
        {
            let store = JsonlTransactionStore::open(&path, options.clone()).unwrap();
            let start = pending("a");
            store.append(start.clone()).unwrap();
            store
                .append(start.complete(ResponseRecord::new(200, "OK").with_body(vec![b'x'; 64])))
                .unwrap();
            assert_eq!(store.get("a").unwrap().unwrap().response.as_ref().unwrap().body.len(), 64);
        }

        let store = JsonlTransactionStore::open(&path, options).unwrap();
        let reloaded = store.get("a").unwrap().unwrap();
        assert!(reloaded.response.as_ref().unwrap().body.is_empty());
    }

    #[test]
    fn test_corrupted_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("traffic.jsonl");
        let valid = serde_json::to_string(&pending("a")).unwrap();
        fs::write(&path, format!("{valid}\nnot json at all\n\n")).unwrap();

        let store = JsonlTransactionStore::open(&path, PersistenceOptions::default()).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.get("a").unwrap().is_some());
    }

    #[test]
    fn test_delete_all_truncates_file() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.append(pending("a")).unwrap();
        store.append(pending("b")).unwrap();

        store.delete_all().unwrap();
        assert!(store.snapshot().unwrap().is_empty());
        assert_eq!(fs::metadata(store.path()).unwrap().len(), 0);

        store.append(pending("c")).unwrap();
        drop(store);

        let store = open(&dir);
        let ids: Vec<String> = store.snapshot().unwrap().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn test_file_stays_bounded_while_running() {
        let dir = TempDir::new().unwrap();
        let options = PersistenceOptions {
            max_transactions: Some(2),
            ..PersistenceOptions::default()
        };
        let store = JsonlTransactionStore::open(dir.path().join("traffic.jsonl"), options.clone())
            .unwrap();

        for i in 0..500 {
            let start = pending(&format!("call-{i}"));
            store.append(start.clone()).unwrap();
            store
                .append(start.complete(ResponseRecord::new(200, "OK")))
                .unwrap();

            let lines = fs::read_to_string(store.path()).unwrap().lines().count();
            assert!(lines <= 4, "{lines} lines after call {i}");
        }
        assert_eq!(store.len().unwrap(), 2);

        let path = store.path().to_path_buf();
        drop(store);
        let reopened = JsonlTransactionStore::open(&path, options).unwrap();
        let ids: Vec<String> = reopened.snapshot().unwrap().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["call-498", "call-499"]);
        assert!(reopened
            .snapshot()
            .unwrap()
            .iter()
            .all(|t| t.status == TransactionStatus::Completed));
    }

    #[test]
    fn test_failed_delete_all_keeps_file() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.append(pending("a")).unwrap();
        store.append(pending("b")).unwrap();

        store.memory.poison();
        assert!(matches!(store.delete_all(), Err(StoreError::Poisoned(_))));

        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_ignored_events_are_not_written() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let start = pending("a");
        store.append(start.clone()).unwrap();
        assert_eq!(store.append(start).unwrap(), AppendOutcome::Ignored);

        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("traffic.jsonl");
        let store = JsonlTransactionStore::open(&path, PersistenceOptions::default()).unwrap();
        store.append(pending("a")).unwrap();
        assert!(path.exists());
    }
}
