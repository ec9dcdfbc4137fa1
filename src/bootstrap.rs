//! Service wiring.
//!
//! [`build_registry`] registers the well-known services from
//! [`registry::keys`](crate::registry::keys) for a loaded configuration. The
//! host resolves [`keys::STORE`] for its interceptor and [`keys::CONTROLLER`]
//! for each inspector screen.

use crate::config::InspectorConfig;
use crate::controller::InspectorController;
use crate::query::QueryEngine;
use crate::registry::{keys, Registry, RegistryError, Scope};
use crate::store::{
    InMemoryTransactionStore, JsonlTransactionStore, PersistenceOptions, TransactionStore,
};
use log::info;
use std::sync::Arc;

/// Builds a registry wired for `config`.
///
/// The store is persisted to `config.persistence_path` when set, and kept in
/// memory otherwise. Nothing is constructed until first resolution.
pub fn build_registry(config: InspectorConfig) -> Registry {
    let registry = Registry::new();
    registry.register_instance(keys::CONFIG, Arc::new(config));

    registry.register(keys::STORE, Scope::Singleton, |registry| {
        let config = registry.resolve(keys::CONFIG)?;
        let store: Arc<dyn TransactionStore> = match &config.persistence_path {
            Some(path) => {
                let store = JsonlTransactionStore::open(path, PersistenceOptions::from(&*config))
                    .map_err(|e| RegistryError::construction(keys::STORE.name(), e))?;
                Arc::new(store)
            }
            None => Arc::new(InMemoryTransactionStore::with_capacity(
                config.max_transactions,
            )),
        };
        Ok(store)
    });

    registry.register(keys::QUERY_ENGINE, Scope::Singleton, |_| {
        Ok(Arc::new(QueryEngine::new()))
    });

    registry.register(keys::CONTROLLER, Scope::Transient, |registry| {
        let config = registry.resolve(keys::CONFIG)?;
        let store = registry.resolve(keys::STORE)?;
        let engine = registry.resolve(keys::QUERY_ENGINE)?;
        Ok(Arc::new(InspectorController::new(store, engine, &config)))
    });

    info!("inspector services registered ({} keys)", registry.len());
    registry
}
