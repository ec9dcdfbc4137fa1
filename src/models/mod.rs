//! Data models for captured network traffic.
//!
//! This module contains the value types handed from the capture interceptor to
//! the transaction store: requests, responses, and the transaction that pairs
//! them with a lifecycle status.

pub mod request;
pub mod response;
pub mod transaction;

pub use request::{HttpMethod, RequestRecord, UnknownMethod};
pub use response::{ResponseRecord, ResponseTiming};
pub use transaction::{Transaction, TransactionStatus};
