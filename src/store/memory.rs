//! In-memory transaction store.

use super::{AppendOutcome, Snapshot, StoreError, TransactionStore};
use crate::models::Transaction;
use log::{debug, trace};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Process-lifetime store guarded by a single `RwLock`.
///
/// Records are kept in insertion order, keyed by a monotonically increasing
/// sequence number. Updating a pending record swaps the `Arc` in its slot, so
/// readers holding an older snapshot keep seeing the old record intact.
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    inner: RwLock<Inner>,
    capacity: Option<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<u64, Arc<Transaction>>,
    index: HashMap<String, u64>,
    next_seq: u64,
    version: u64,
}

impl Inner {
    fn classify(&self, transaction: &Transaction) -> AppendOutcome {
        match self.index.get(&transaction.id) {
            None => AppendOutcome::Inserted,
            Some(seq) => {
                let existing = &self.records[seq];
                if existing.is_terminal() || !transaction.is_terminal() {
                    AppendOutcome::Ignored
                } else {
                    AppendOutcome::Updated
                }
            }
        }
    }
}

impl InMemoryTransactionStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that evicts its oldest records once `capacity` is exceeded.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::default(),
            capacity: Some(capacity.max(1)),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Mutation counter; bumped by every accepted append and by `delete_all`.
    pub fn version(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.version)
    }

    /// Reports what `append` would do with `transaction` without applying it.
    pub(crate) fn classify(&self, transaction: &Transaction) -> Result<AppendOutcome, StoreError> {
        Ok(self.read()?.classify(transaction))
    }

    /// Poisons the lock, as a writer panicking mid-update would.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.inner.write();
            panic!("writer panicked while holding the store lock");
        }));
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn append(&self, transaction: Transaction) -> Result<AppendOutcome, StoreError> {
        let mut inner = self.write()?;
        let outcome = inner.classify(&transaction);

        match outcome {
            AppendOutcome::Ignored => {
                trace!("ignoring duplicate event for transaction {}", transaction.id);
            }
            AppendOutcome::Updated => {
                let seq = inner.index[&transaction.id];
                let existing = Arc::clone(&inner.records[&seq]);
                // Identity, request and start time come from the original capture.
                let merged = Transaction {
                    response: transaction.response,
                    status: transaction.status,
                    end_time: transaction.end_time,
                    error: transaction.error,
                    ..(*existing).clone()
                };
                inner.records.insert(seq, Arc::new(merged));
                inner.version += 1;
            }
            AppendOutcome::Inserted => {
                let seq = inner.next_seq;
                inner.next_seq += 1;
                inner.index.insert(transaction.id.clone(), seq);
                inner.records.insert(seq, Arc::new(transaction));
                inner.version += 1;

                if let Some(capacity) = self.capacity {
                    while inner.records.len() > capacity {
                        let Some((_, evicted)) = inner.records.pop_first() else {
                            break;
                        };
                        debug!("evicting transaction {} (capacity {})", evicted.id, capacity);
                        inner.index.remove(&evicted.id);
                    }
                }
            }
        }

        Ok(outcome)
    }

    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let inner = self.read()?;
        let items = inner.records.values().cloned().collect();
        Ok(Snapshot::new(items, inner.version))
    }

    fn get(&self, id: &str) -> Result<Option<Arc<Transaction>>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .index
            .get(id)
            .and_then(|seq| inner.records.get(seq))
            .cloned())
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let removed = inner.records.len();
        inner.records.clear();
        inner.index.clear();
        inner.version += 1;
        debug!("deleted {} transactions", removed);
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpMethod, RequestRecord, ResponseRecord, TransactionStatus};
    use std::sync::Barrier;

    fn pending(id: &str, url: &str) -> Transaction {
        Transaction::started_at(
            id,
            RequestRecord::new(HttpMethod::GET, url),
            chrono::Utc::now(),
        )
    }

    #[test]
    fn test_append_preserves_insertion_order() {
        let store = InMemoryTransactionStore::new();
        for id in ["a", "b", "c"] {
            assert_eq!(
                store.append(pending(id, "https://x/")).unwrap(),
                AppendOutcome::Inserted
            );
        }

        let ids: Vec<String> = store.snapshot().unwrap().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_completion_updates_in_place() {
        let store = InMemoryTransactionStore::new();
        let start = pending("a", "https://api.example.com/users");
        store.append(start.clone()).unwrap();
        store.append(pending("b", "https://x/")).unwrap();

        let outcome = store
            .append(start.complete(ResponseRecord::new(200, "OK")))
            .unwrap();
        assert_eq!(outcome, AppendOutcome::Updated);

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.as_slice()[0].id, "a");
        assert_eq!(snapshot.as_slice()[0].status, TransactionStatus::Completed);
        assert_eq!(snapshot.as_slice()[0].status_code(), Some(200));
    }

    #[test]
    fn test_update_keeps_original_request() {
        let store = InMemoryTransactionStore::new();
        let start = pending("a", "https://api.example.com/users");
        store.append(start.clone()).unwrap();

        let mut finish = start.clone().complete(ResponseRecord::new(201, "Created"));
        finish.request.url = "https://tampered/".to_string();
        store.append(finish).unwrap();

        let stored = store.get("a").unwrap().unwrap();
        assert_eq!(stored.request.url, "https://api.example.com/users");
        assert_eq!(stored.start_time, start.start_time);
    }

    #[test]
    fn test_terminal_records_are_never_modified() {
        let store = InMemoryTransactionStore::new();
        let start = pending("a", "https://x/");
        store.append(start.clone()).unwrap();
        store
            .append(start.clone().complete(ResponseRecord::new(200, "OK")))
            .unwrap();
        let version = store.version().unwrap();

        assert_eq!(
            store.append(start.clone().fail("late failure")).unwrap(),
            AppendOutcome::Ignored
        );
        assert_eq!(store.append(start).unwrap(), AppendOutcome::Ignored);
        assert_eq!(store.version().unwrap(), version);
        assert_eq!(store.get("a").unwrap().unwrap().status_code(), Some(200));
    }

    #[test]
    fn test_duplicate_start_is_ignored() {
        let store = InMemoryTransactionStore::new();
        let start = pending("a", "https://x/");
        store.append(start.clone()).unwrap();
        assert_eq!(store.append(start).unwrap(), AppendOutcome::Ignored);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let store = InMemoryTransactionStore::new();
        let start = pending("a", "https://x/");
        store.append(start.clone()).unwrap();

        let before = store.snapshot().unwrap();
        store
            .append(start.complete(ResponseRecord::new(500, "Error")))
            .unwrap();
        store.append(pending("b", "https://x/")).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(before.as_slice()[0].status, TransactionStatus::Pending);
        assert!(store.snapshot().unwrap().version() > before.version());
    }

    #[test]
    fn test_delete_all_then_append() {
        let store = InMemoryTransactionStore::new();
        store.append(pending("a", "https://x/")).unwrap();
        store.append(pending("b", "https://x/")).unwrap();

        store.delete_all().unwrap();
        assert!(store.snapshot().unwrap().is_empty());
        assert!(store.get("a").unwrap().is_none());

        store.append(pending("c", "https://x/")).unwrap();
        let ids: Vec<String> = store.snapshot().unwrap().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = InMemoryTransactionStore::with_capacity(2);
        for id in ["a", "b", "c"] {
            store.append(pending(id, "https://x/")).unwrap();
        }

        let ids: Vec<String> = store.snapshot().unwrap().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn test_concurrent_appends_and_snapshots_are_consistent() {
        const WRITERS: usize = 4;
        const PER_WRITER: usize = 200;

        let store = InMemoryTransactionStore::new();
        let barrier = Barrier::new(WRITERS + 1);

        std::thread::scope(|scope| {
            for w in 0..WRITERS {
                let store = &store;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    for i in 0..PER_WRITER {
                        let tx = pending(&format!("{w}-{i}"), "https://x/");
                        store.append(tx.clone()).unwrap();
                        store
                            .append(tx.complete(ResponseRecord::new(200, "OK")))
                            .unwrap();
                    }
                });
            }

            barrier.wait();
            let mut last_len = 0;
            for _ in 0..100 {
                let snapshot = store.snapshot().unwrap();
                assert!(snapshot.len() >= last_len);
                last_len = snapshot.len();

                let mut seen = std::collections::HashSet::new();
                for tx in &snapshot {
                    assert!(seen.insert(tx.id.clone()), "duplicate id {}", tx.id);
                    // A record is either fully pending or fully completed.
                    match tx.status {
                        TransactionStatus::Pending => {
                            assert!(tx.response.is_none() && tx.end_time.is_none())
                        }
                        _ => assert!(tx.response.is_some() && tx.end_time.is_some()),
                    }
                }
            }
        });

        assert_eq!(store.len().unwrap(), WRITERS * PER_WRITER);
    }
}
