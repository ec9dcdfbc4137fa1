//! Filtering and ordering over store snapshots.

use super::filter::Filter;
use crate::models::Transaction;
use std::cmp::Ordering;
use std::sync::Arc;

/// Stateless query engine.
///
/// Holds no data between calls; it exists as a type so it can be registered
/// and resolved like the other inspector services.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEngine;

impl QueryEngine {
    pub fn new() -> Self {
        Self
    }

    /// Returns the transactions matching `filter`, most recent first.
    ///
    /// Ties on `start_time` are broken by ascending `id`, so the result is
    /// fully determined by the input set. The input is never modified.
    pub fn filter(&self, snapshot: &[Arc<Transaction>], filter: &Filter) -> Vec<Arc<Transaction>> {
        let compiled = filter.compile();
        let mut matched: Vec<Arc<Transaction>> = snapshot
            .iter()
            .filter(|transaction| compiled.matches(transaction))
            .cloned()
            .collect();
        sort_recent_first(&mut matched);
        matched
    }

    /// Counts matches without building the result.
    pub fn count(&self, snapshot: &[Arc<Transaction>], filter: &Filter) -> usize {
        let compiled = filter.compile();
        snapshot
            .iter()
            .filter(|transaction| compiled.matches(transaction))
            .count()
    }
}

/// Display order: descending start time, then ascending id.
pub fn compare_recent_first(a: &Transaction, b: &Transaction) -> Ordering {
    b.start_time
        .cmp(&a.start_time)
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_recent_first(transactions: &mut [Arc<Transaction>]) {
    transactions.sort_by(|a, b| compare_recent_first(a, b));
}
