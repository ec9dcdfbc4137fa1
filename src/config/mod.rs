//! Configuration management for the traffic inspector.
//!
//! Configuration is read from a settings JSON object under the `"inspector"`
//! key and merged with defaults. There is no process-wide configuration: the
//! loaded [`InspectorConfig`] is registered in the service registry and passed
//! to whatever needs it.

pub mod schema;

pub use schema::{InspectorConfig, MAX_SEARCH_DEBOUNCE_MS};

use log::warn;
use serde_json::Value;

/// Settings key holding inspector configuration.
pub const SETTINGS_KEY: &str = "inspector";

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A setting has a value outside its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Loads configuration from a settings JSON value.
///
/// Settings under the `"inspector"` key are merged over the defaults and the
/// result is validated. Settings that cannot be parsed at all are ignored
/// with a warning; settings that parse but are out of range are an error.
///
/// # Example
///
/// ```
/// use traffic_inspector::config::load_config;
/// use serde_json::json;
///
/// let settings = json!({
///     "inspector": {
///         "itemsPerPage": 50,
///         "searchDebounceMs": 150
///     }
/// });
///
/// let config = load_config(Some(settings)).unwrap();
/// assert_eq!(config.items_per_page, 50);
/// ```
pub fn load_config(settings_json: Option<Value>) -> Result<InspectorConfig, ConfigError> {
    let mut config = InspectorConfig::default();

    if let Some(settings) = settings_json {
        if let Some(inspector_settings) = settings.get(SETTINGS_KEY) {
            match serde_json::from_value::<InspectorConfig>(inspector_settings.clone()) {
                Ok(user_config) => {
                    config = config.merge(&user_config);
                }
                Err(e) => {
                    warn!(
                        "failed to parse {} settings: {}; using defaults",
                        SETTINGS_KEY, e
                    );
                }
            }
        }
    }

    config.validate()?;
    Ok(config)
}
