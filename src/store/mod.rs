//! Transaction storage.
//!
//! The store is the only mutable shared resource in the inspector. The capture
//! interceptor writes through [`TransactionStore::append`]; every reader gets a
//! [`Snapshot`], an immutable copy of the collection at one instant.
//!
//! Two implementations are provided:
//!
//! - [`InMemoryTransactionStore`]: process-lifetime storage with an optional
//!   capacity limit.
//! - [`JsonlTransactionStore`]: wraps the in-memory store and mirrors every
//!   accepted event to a JSON Lines file so captures survive restarts.

pub mod memory;
pub mod persistent;

pub use memory::InMemoryTransactionStore;
pub use persistent::{JsonlTransactionStore, PersistenceOptions, ReplayReport, SENSITIVE_HEADERS};

use crate::models::Transaction;
use std::sync::Arc;

/// Errors raised by a transaction store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("transaction store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error("transaction store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A writer panicked while holding the store lock.
    #[error("transaction store lock poisoned: {0}")]
    Poisoned(String),

    /// The backing store cannot serve requests right now.
    #[error("transaction store unavailable: {0}")]
    Unavailable(String),
}

/// What [`TransactionStore::append`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The id was new; the record was added at the end.
    Inserted,
    /// A pending record with the same id received its terminal fields.
    Updated,
    /// Duplicate delivery: the id is known and the event adds nothing.
    Ignored,
}

/// Point-in-time, immutable view of a store.
///
/// Cloning a snapshot is cheap; the records themselves are shared.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    items: Arc<[Arc<Transaction>]>,
    version: u64,
}

impl Snapshot {
    pub fn new(items: Vec<Arc<Transaction>>, version: u64) -> Self {
        Self {
            items: items.into(),
            version,
        }
    }

    /// Records in insertion order.
    pub fn as_slice(&self) -> &[Arc<Transaction>] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Transaction>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Store version the snapshot was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Arc<Transaction>;
    type IntoIter = std::slice::Iter<'a, Arc<Transaction>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Thread-safe collection of captured transactions.
///
/// Implementations must keep these guarantees:
///
/// - `append` either inserts a new id at the end or attaches terminal fields
///   to a pending record with the same id. Terminal records never change.
/// - `snapshot` and `get` never observe a partially applied `append` or
///   `delete_all`.
/// - Callers only ever receive copies; nothing hands out the live collection.
pub trait TransactionStore: Send + Sync {
    /// Adds a record, or completes the pending record with the same id.
    fn append(&self, transaction: Transaction) -> Result<AppendOutcome, StoreError>;

    /// Consistent copy of every record, in insertion order.
    fn snapshot(&self) -> Result<Snapshot, StoreError>;

    /// Point lookup by id.
    fn get(&self, id: &str) -> Result<Option<Arc<Transaction>>, StoreError>;

    /// Removes every record atomically.
    fn delete_all(&self) -> Result<(), StoreError>;

    /// Number of records currently stored.
    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.snapshot()?.len())
    }

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}
