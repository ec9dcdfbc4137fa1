//! In-app HTTP traffic inspection.
//!
//! This crate is the core behind a network inspector screen: an interceptor
//! appends captured calls to a [`TransactionStore`], and an
//! [`InspectorController`] filters, orders and pages through them for display.
//!
//! # Architecture
//!
//! - **registry**: typed service registry with singleton and transient scopes
//! - **store**: thread-safe transaction storage, in memory or persisted as JSON Lines
//! - **query**: filtering (method, status, search, time range) and recent-first ordering
//! - **pagination**: fixed-size pages and the "load more" cursor
//! - **controller**: async state machine with debounced search and stale-result guards
//! - **config**: `InspectorConfig` loaded from a settings JSON object
//! - **export**: cURL and JSON export of captured traffic
//! - **bootstrap**: wiring of the well-known services
//!
//! # Usage
//!
//! ```
//! use traffic_inspector::bootstrap::build_registry;
//! use traffic_inspector::config::InspectorConfig;
//! use traffic_inspector::models::{HttpMethod, RequestRecord, ResponseRecord, Transaction};
//! use traffic_inspector::registry::keys;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = build_registry(InspectorConfig::default());
//!
//! // Interceptor side.
//! let store = registry.require(keys::STORE);
//! let pending = Transaction::started(RequestRecord::new(HttpMethod::GET, "https://api.example.com/users"));
//! store.append(pending.clone()).unwrap();
//! store.append(pending.complete(ResponseRecord::new(200, "OK"))).unwrap();
//!
//! // Presentation side.
//! let controller = registry.require(keys::CONTROLLER);
//! controller.reload().await;
//! assert_eq!(controller.state().transactions.len(), 1);
//! # });
//! ```

pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod export;
pub mod models;
pub mod pagination;
pub mod query;
pub mod registry;
pub mod store;

pub use controller::{InspectorController, InspectorState, Phase};
pub use models::{Transaction, TransactionStatus};
pub use query::{Filter, QueryEngine};
pub use registry::{Registry, Scope, ServiceKey};
pub use store::TransactionStore;
