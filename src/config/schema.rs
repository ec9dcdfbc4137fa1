//! Configuration schema for the traffic inspector.
//!
//! This module defines the configuration structure and validation logic for
//! every user-configurable setting of the inspector core.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for the search debounce window.
pub const MAX_SEARCH_DEBOUNCE_MS: u64 = 10_000;

/// Main configuration structure for the inspector.
///
/// Read from the `"inspector"` key of a settings JSON object. Missing settings
/// fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorConfig {
    /// Rows per page in the traffic list. Defaults to 20.
    ///
    /// Must be greater than 0.
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,

    /// Quiet period before a search query runs, in milliseconds. Defaults to 300.
    ///
    /// Must not exceed [`MAX_SEARCH_DEBOUNCE_MS`].
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Maximum number of transactions kept; oldest are evicted first.
    /// Defaults to 1000.
    ///
    /// Must be greater than 0.
    #[serde(default = "default_max_transactions")]
    pub max_transactions: usize,

    /// Redact authentication headers in persisted records. Defaults to true.
    #[serde(default = "default_sanitize_sensitive_headers")]
    pub sanitize_sensitive_headers: bool,

    /// Response bodies above this size are not persisted. Defaults to 1 MiB.
    #[serde(default = "default_max_persisted_body_bytes")]
    pub max_persisted_body_bytes: usize,

    /// JSON Lines file for captured traffic.
    ///
    /// When unset, captures live in memory for the lifetime of the process.
    #[serde(default)]
    pub persistence_path: Option<PathBuf>,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            items_per_page: default_items_per_page(),
            search_debounce_ms: default_search_debounce_ms(),
            max_transactions: default_max_transactions(),
            sanitize_sensitive_headers: default_sanitize_sensitive_headers(),
            max_persisted_body_bytes: default_max_persisted_body_bytes(),
            persistence_path: None,
        }
    }
}

impl InspectorConfig {
    /// Checks every setting and reports the first invalid one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.items_per_page == 0 {
            return Err(ConfigError::Invalid(
                "itemsPerPage must be greater than 0".to_string(),
            ));
        }

        if self.max_transactions == 0 {
            return Err(ConfigError::Invalid(
                "maxTransactions must be greater than 0".to_string(),
            ));
        }

        if self.search_debounce_ms > MAX_SEARCH_DEBOUNCE_MS {
            return Err(ConfigError::Invalid(format!(
                "searchDebounceMs must be at most {}",
                MAX_SEARCH_DEBOUNCE_MS
            )));
        }

        Ok(())
    }

    /// The debounce window as a `Duration`.
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Merges this configuration with another, using values from `other`.
    ///
    /// `persistence_path` is only taken from `other` when it is set.
    pub fn merge(&self, other: &InspectorConfig) -> Self {
        Self {
            items_per_page: other.items_per_page,
            search_debounce_ms: other.search_debounce_ms,
            max_transactions: other.max_transactions,
            sanitize_sensitive_headers: other.sanitize_sensitive_headers,
            max_persisted_body_bytes: other.max_persisted_body_bytes,
            persistence_path: other
                .persistence_path
                .clone()
                .or_else(|| self.persistence_path.clone()),
        }
    }
}

// Default value functions for serde

fn default_items_per_page() -> usize {
    20
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_max_transactions() -> usize {
    1000
}

fn default_sanitize_sensitive_headers() -> bool {
    true
}

fn default_max_persisted_body_bytes() -> usize {
    1_048_576 // 1MB
}
