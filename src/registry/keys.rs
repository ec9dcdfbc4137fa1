//! Well-known service keys.

use super::ServiceKey;
use crate::config::InspectorConfig;
use crate::controller::InspectorController;
use crate::query::QueryEngine;
use crate::store::TransactionStore;

pub const CONFIG: ServiceKey<InspectorConfig> = ServiceKey::new("inspector.config");

/// The capture store the interceptor appends to and the controller reads.
pub const STORE: ServiceKey<dyn TransactionStore> = ServiceKey::new("inspector.store");

pub const QUERY_ENGINE: ServiceKey<QueryEngine> = ServiceKey::new("inspector.query_engine");

/// Transient: every resolution yields a controller with its own filter and page.
pub const CONTROLLER: ServiceKey<InspectorController> = ServiceKey::new("inspector.controller");
