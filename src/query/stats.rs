//! Summary statistics over a set of transactions.

use crate::models::{Transaction, TransactionStatus};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
    /// Completed with a 2xx or 3xx status.
    pub successful: usize,
    /// Completed with a 4xx or 5xx status.
    pub errors: usize,
    /// Mean duration of completed calls.
    pub average_duration: Option<Duration>,
}

impl TransactionStats {
    pub fn collect(transactions: &[Arc<Transaction>]) -> Self {
        let mut stats = Self {
            total: transactions.len(),
            ..Self::default()
        };
        let mut total_duration = Duration::ZERO;
        let mut timed = 0u32;

        for transaction in transactions {
            match transaction.status {
                TransactionStatus::Pending => stats.pending += 1,
                TransactionStatus::Failed => stats.failed += 1,
                TransactionStatus::Completed => {
                    stats.completed += 1;
                    if let Some(response) = &transaction.response {
                        if response.is_success() || response.is_redirect() {
                            stats.successful += 1;
                        } else if response.is_client_error() || response.is_server_error() {
                            stats.errors += 1;
                        }
                    }
                    if let Some(duration) = transaction.duration() {
                        total_duration += duration;
                        timed += 1;
                    }
                }
            }
        }

        if timed > 0 {
            stats.average_duration = Some(total_duration / timed);
        }
        stats
    }

    fn percent(&self, part: usize) -> f64 {
        if self.total > 0 {
            (part as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// One-line summary, e.g. `Total: 4 | Success: 2 (50.0%) | Errors: 1 (25.0%) | Pending: 1`.
    pub fn summary(&self) -> String {
        format!(
            "Total: {} | Success: {} ({:.1}%) | Errors: {} ({:.1}%) | Pending: {}",
            self.total,
            self.successful,
            self.percent(self.successful),
            self.errors + self.failed,
            self.percent(self.errors + self.failed),
            self.pending
        )
    }
}
