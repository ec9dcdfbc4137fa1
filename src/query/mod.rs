//! Search and filtering over captured traffic.
//!
//! Everything here is a pure function of a snapshot and a [`Filter`]: nothing
//! is cached and the input is never modified.
//!
//! # Example
//!
//! ```
//! use traffic_inspector::models::HttpMethod;
//! use traffic_inspector::query::{Filter, QueryEngine};
//!
//! let filter = Filter::default()
//!     .with_method(HttpMethod::GET)
//!     .with_search("api/users");
//! let result = QueryEngine::new().filter(&[], &filter);
//! assert!(result.is_empty());
//! ```

pub mod engine;
pub mod filter;
pub mod stats;

pub use engine::{compare_recent_first, sort_recent_first, QueryEngine};
pub use filter::{CompiledFilter, Filter, TimeRange};
pub use stats::TransactionStats;
