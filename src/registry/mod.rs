//! Typed service registry.
//!
//! The [`Registry`] maps [`ServiceKey`]s to factories and hands out shared
//! (`Singleton`) or per-use (`Transient`) instances. It is an ordinary value:
//! construct one at startup and pass it to whatever needs to resolve services.
//!
//! # Concurrency
//!
//! Each singleton registration owns its own `OnceCell`. Resolution clones the
//! cell out of the entry table and initialises it outside the table lock, so
//! construction of one service never blocks resolution of an unrelated one,
//! and concurrent resolvers of the same key all wait for a single factory run.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use traffic_inspector::registry::{Registry, Scope, ServiceKey};
//!
//! const GREETING: ServiceKey<String> = ServiceKey::new("greeting");
//!
//! let registry = Registry::new();
//! registry.register(GREETING, Scope::Singleton, |_| Ok(Arc::new("hello".to_string())));
//!
//! let a = registry.resolve(GREETING).unwrap();
//! let b = registry.resolve(GREETING).unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

pub mod error;
pub mod keys;

pub use error::RegistryError;

use dashmap::DashMap;
use log::{debug, error, warn};
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Lifetime policy of a registration. Fixed when the entry is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One instance for the lifetime of the registration, built on first use.
    Singleton,
    /// A fresh instance on every resolution.
    Transient,
}

/// Typed identifier for a service.
///
/// `T` may be unsized, so trait-object services are keyed as
/// `ServiceKey<dyn Trait>` and resolve to `Arc<dyn Trait>`.
pub struct ServiceKey<T: ?Sized> {
    name: &'static str,
    _marker: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized> ServiceKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: ?Sized> Clone for ServiceKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for ServiceKey<T> {}

impl<T: ?Sized> fmt::Debug for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceKey").field(&self.name).finish()
    }
}

/// Boxed `Arc<T>` for some service type `T`.
type Instance = Box<dyn Any + Send + Sync>;

type Factory = Arc<dyn Fn(&Registry) -> Result<Instance, RegistryError> + Send + Sync>;

struct Entry {
    scope: Scope,
    type_id: TypeId,
    type_name: &'static str,
    factory: Factory,
    cell: Arc<OnceCell<Instance>>,
}

/// Type-keyed store of service factories and cached singletons.
#[derive(Default)]
pub struct Registry {
    entries: DashMap<&'static str, Entry>,
}

thread_local! {
    /// Keys currently being resolved on this thread, outermost first.
    static RESOLVING: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

/// Marks a key as "being resolved" on the current thread until dropped.
struct ResolutionGuard {
    key: &'static str,
}

impl ResolutionGuard {
    fn enter(key: &'static str) -> Result<Self, RegistryError> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&key) {
                let mut chain: Vec<&str> = stack.clone();
                chain.push(key);
                return Err(RegistryError::CircularDependency {
                    chain: chain.join(" -> "),
                });
            }
            stack.push(key);
            Ok(Self { key })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|k| *k == self.key) {
                stack.remove(pos);
            }
        });
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `key` with the given scope.
    ///
    /// Registering a key twice replaces the previous entry and drops its
    /// cached singleton, so the next resolution constructs a new instance.
    /// Re-registration is almost always a wiring mistake and is logged.
    pub fn register<T, F>(&self, key: ServiceKey<T>, scope: Scope, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Registry) -> Result<Arc<T>, RegistryError> + Send + Sync + 'static,
    {
        let entry = Entry {
            scope,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            factory: Arc::new(move |registry| {
                factory(registry).map(|instance| Box::new(instance) as Instance)
            }),
            cell: Arc::new(OnceCell::new()),
        };

        if let Some(previous) = self.entries.insert(key.name, entry) {
            let had_instance = previous.cell.get().is_some();
            if cfg!(debug_assertions) {
                error!(
                    "service '{}' registered more than once (cached instance dropped: {})",
                    key.name, had_instance
                );
            } else {
                warn!("service '{}' re-registered", key.name);
            }
        } else {
            debug!("registered service '{}' as {:?}", key.name, scope);
        }
    }

    /// Registers an already-built instance as a singleton.
    pub fn register_instance<T>(&self, key: ServiceKey<T>, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register(key, Scope::Singleton, move |_| Ok(Arc::clone(&instance)));
    }

    /// Resolves an instance for `key`.
    ///
    /// Singletons are constructed at most once, on first resolution, even when
    /// many threads resolve the key concurrently. A failed construction is not
    /// cached; the next resolution retries the factory.
    pub fn resolve<T>(&self, key: ServiceKey<T>) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let requested = std::any::type_name::<T>();

        // Copy what we need out of the table so no shard lock is held while
        // the factory runs (factories resolve their own dependencies).
        let (scope, factory, cell) = {
            let entry = self
                .entries
                .get(key.name)
                .ok_or(RegistryError::Unregistered { key: key.name })?;
            if entry.type_id != TypeId::of::<T>() {
                return Err(RegistryError::TypeMismatch {
                    key: key.name,
                    registered: entry.type_name,
                    requested,
                });
            }
            (entry.scope, Arc::clone(&entry.factory), Arc::clone(&entry.cell))
        };

        let _guard = ResolutionGuard::enter(key.name)?;

        match scope {
            Scope::Transient => {
                let instance = factory(self)?;
                downcast::<T>(key.name, &instance, requested)
            }
            Scope::Singleton => {
                let instance = cell.get_or_try_init(|| {
                    debug!("constructing singleton '{}'", key.name);
                    factory(self)
                })?;
                downcast::<T>(key.name, instance, requested)
            }
        }
    }

    /// Resolves `key`, panicking if the registry is not wired for it.
    ///
    /// Use during startup wiring, where a missing registration is a
    /// programming error and there is nothing sensible to fall back to.
    pub fn require<T>(&self, key: ServiceKey<T>) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.resolve(key) {
            Ok(instance) => instance,
            Err(err) => {
                error!("fatal registry error: {}", err);
                panic!("service wiring is incomplete: {err}");
            }
        }
    }

    pub fn is_registered<T: ?Sized>(&self, key: ServiceKey<T>) -> bool {
        self.entries.contains_key(key.name)
    }

    pub fn scope_of<T: ?Sized>(&self, key: ServiceKey<T>) -> Option<Scope> {
        self.entries.get(key.name).map(|entry| entry.scope)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn downcast<T>(
    key: &'static str,
    instance: &Instance,
    requested: &'static str,
) -> Result<Arc<T>, RegistryError>
where
    T: ?Sized + Send + Sync + 'static,
{
    instance
        .downcast_ref::<Arc<T>>()
        .map(Arc::clone)
        .ok_or(RegistryError::TypeMismatch {
            key,
            registered: "<unknown>",
            requested,
        })
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&'static str> = self.entries.iter().map(|entry| *entry.key()).collect();
        keys.sort_unstable();
        f.debug_struct("Registry").field("keys", &keys).finish()
    }
}
