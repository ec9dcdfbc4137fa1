//! Captured network transactions.
//!
//! A [`Transaction`] is created by the interceptor when a call starts and
//! replaced exactly once by its terminal version when the call finishes.
//! Records are never edited in place: [`Transaction::complete`] and
//! [`Transaction::fail`] consume the pending record and return a new one.

use super::{RequestRecord, ResponseRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle state of a captured call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// The request has been sent and no response has arrived yet.
    Pending,
    /// A response was received (any status code).
    Completed,
    /// The call failed at the transport level.
    Failed,
}

impl TransactionStatus {
    /// `true` for [`Completed`](Self::Completed) and [`Failed`](Self::Failed).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One captured network call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Identity of the call, unique for the lifetime of a store.
    pub id: String,

    /// What was sent.
    pub request: RequestRecord,

    /// What came back, once the call has completed.
    pub response: Option<ResponseRecord>,

    /// Lifecycle state.
    pub status: TransactionStatus,

    /// When the interceptor saw the call start.
    pub start_time: DateTime<Utc>,

    /// When the call reached a terminal state.
    pub end_time: Option<DateTime<Utc>>,

    /// Transport failure description for failed calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Transaction {
    /// Creates a pending transaction with a fresh UUID v4 id, started now.
    pub fn started(request: RequestRecord) -> Self {
        Self::started_at(uuid::Uuid::new_v4().to_string(), request, Utc::now())
    }

    /// Creates a pending transaction with an explicit id and start time.
    pub fn started_at(
        id: impl Into<String>,
        request: RequestRecord,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            request,
            response: None,
            status: TransactionStatus::Pending,
            start_time,
            end_time: None,
            error: None,
        }
    }

    /// Terminal record for a call that received a response, finished now.
    pub fn complete(self, response: ResponseRecord) -> Self {
        self.complete_at(response, Utc::now())
    }

    /// Terminal record for a call that received a response at `end_time`.
    pub fn complete_at(self, response: ResponseRecord, end_time: DateTime<Utc>) -> Self {
        Self {
            response: Some(response),
            status: TransactionStatus::Completed,
            end_time: Some(end_time),
            error: None,
            ..self
        }
    }

    /// Terminal record for a call that failed, finished now.
    pub fn fail(self, reason: impl Into<String>) -> Self {
        self.fail_at(reason, Utc::now())
    }

    /// Terminal record for a call that failed at `end_time`.
    pub fn fail_at(self, reason: impl Into<String>, end_time: DateTime<Utc>) -> Self {
        Self {
            response: None,
            status: TransactionStatus::Failed,
            end_time: Some(end_time),
            error: Some(reason.into()),
            ..self
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Status code of the response, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.response.as_ref().map(|response| response.status_code)
    }

    /// Wall-clock duration between start and end.
    ///
    /// `None` while pending, or if the clock went backwards.
    pub fn duration(&self) -> Option<Duration> {
        let end = self.end_time?;
        (end - self.start_time).to_std().ok()
    }
}
