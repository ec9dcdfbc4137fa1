//! Filter predicates for captured traffic.

use crate::models::{HttpMethod, Transaction, TransactionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive start-time window.
///
/// A range whose end precedes its start is accepted as-is and simply matches
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `false` when `end < start`.
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Optional predicates combined with logical AND.
///
/// The default filter matches every transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub method: Option<HttpMethod>,
    pub status_code: Option<u16>,
    pub search_term: Option<String>,
    pub time_range: Option<TimeRange>,
    pub status: Option<TransactionStatus>,
}

impl Filter {
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Search term as typed; blank terms are absent.
    pub fn effective_search(&self) -> Option<&str> {
        self.search_term
            .as_deref()
            .filter(|term| !term.trim().is_empty())
    }

    /// `true` if no predicate is active.
    pub fn is_match_all(&self) -> bool {
        self.method.is_none()
            && self.status_code.is_none()
            && self.effective_search().is_none()
            && self.time_range.is_none()
            && self.status.is_none()
    }

    /// Compiles the filter for repeated evaluation.
    pub fn compile(&self) -> CompiledFilter<'_> {
        CompiledFilter {
            filter: self,
            search_lower: self.effective_search().map(str::to_lowercase),
        }
    }

    /// Evaluates the filter against a single transaction.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.compile().matches(transaction)
    }
}

/// A [`Filter`] with its search term pre-lowered.
#[derive(Debug)]
pub struct CompiledFilter<'a> {
    filter: &'a Filter,
    search_lower: Option<String>,
}

impl CompiledFilter<'_> {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(method) = self.filter.method {
            if transaction.request.method != method {
                return false;
            }
        }

        if let Some(status_code) = self.filter.status_code {
            // Transactions without a response never match a status code.
            if transaction.status_code() != Some(status_code) {
                return false;
            }
        }

        if let Some(status) = self.filter.status {
            if transaction.status != status {
                return false;
            }
        }

        if let Some(range) = &self.filter.time_range {
            if !range.contains(transaction.start_time) {
                return false;
            }
        }

        if let Some(term) = &self.search_lower {
            let url_matches = transaction.request.url.to_lowercase().contains(term.as_str());
            let method_matches = transaction
                .request
                .method
                .as_str()
                .to_lowercase()
                .contains(term.as_str());
            if !url_matches && !method_matches {
                return false;
            }
        }

        true
    }
}
