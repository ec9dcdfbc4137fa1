//! Errors raised while wiring or resolving services.

/// A service could not be resolved.
///
/// Every variant except [`Construction`](RegistryError::Construction) indicates
/// incomplete or inconsistent wiring and should be treated as fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No factory was registered under the key.
    #[error("no registration for service '{key}'")]
    Unregistered { key: &'static str },

    /// The key was registered for a different type than the one requested.
    #[error("service '{key}' is registered as {registered}, requested as {requested}")]
    TypeMismatch {
        key: &'static str,
        registered: &'static str,
        requested: &'static str,
    },

    /// A factory (directly or indirectly) resolved the service it is building.
    #[error("circular dependency while resolving services: {chain}")]
    CircularDependency { chain: String },

    /// The factory ran and reported a failure.
    #[error("failed to construct service '{key}': {message}")]
    Construction { key: &'static str, message: String },
}

impl RegistryError {
    /// Wraps any displayable error as a construction failure for `key`.
    pub fn construction(key: &'static str, err: impl std::fmt::Display) -> Self {
        RegistryError::Construction {
            key,
            message: err.to_string(),
        }
    }

    /// `true` for errors caused by wiring rather than by a failing factory.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, RegistryError::Construction { .. })
    }
}
