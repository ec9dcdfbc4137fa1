//! State published by the inspector controller.

use crate::models::Transaction;
use crate::pagination::PageState;
use crate::query::Filter;
use crate::store::StoreError;
use std::sync::Arc;

/// Load state machine: `Idle -> Loading -> {Loaded, Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing has been loaded yet.
    #[default]
    Idle,
    /// A query is in flight.
    Loading,
    /// The last query succeeded.
    Loaded,
    /// The last query failed; see [`InspectorState::error`].
    Error,
}

/// Errors surfaced to the presentation layer.
#[derive(Debug, thiserror::Error)]
pub enum InspectorError {
    /// The transaction store could not be read or cleared.
    #[error("failed to access captured traffic: {0}")]
    Store(#[from] StoreError),

    /// The background query task panicked or was cancelled.
    #[error("query task failed: {0}")]
    Task(String),

    #[error("items per page must be greater than 0")]
    InvalidPageSize,
}

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, Default)]
pub struct InspectorState {
    pub phase: Phase,

    /// Rows revealed so far (page 0 through the current page).
    pub transactions: Vec<Arc<Transaction>>,

    pub is_loading: bool,

    /// Set while in [`Phase::Error`]; call `retry()` to reload.
    pub error: Option<Arc<InspectorError>>,

    pub has_more_pages: bool,

    pub page: PageState,

    /// Size of the whole filtered result.
    pub total_count: usize,

    /// Filter the rows were produced with.
    pub filter: Filter,

    /// Generation stamp; strictly increasing across published results.
    pub version: u64,
}

impl InspectorState {
    /// `true` when a load finished with no matching rows.
    pub fn is_empty(&self) -> bool {
        self.phase == Phase::Loaded && self.total_count == 0
    }
}
