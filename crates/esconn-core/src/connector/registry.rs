//! Connector registry -- constructors for the available connectors, by name.
//!
//! A data source names its connector (e.g. `"elasticsearch"`) and the
//! registry builds it from the data source's settings and event bus.

use std::collections::HashMap;
use std::sync::Arc;

use super::trait_def::Connector;
use crate::config::ConnectionSettings;
use crate::elasticsearch::ElasticsearchConnector;
use crate::error::ConnectorError;
use crate::events::EventBus;

/// Builds a connector for one data source.
pub type ConnectorFactory =
    fn(&ConnectionSettings, EventBus) -> Result<Arc<dyn Connector>, ConnectorError>;

/// Named connector constructors.
///
/// # Example
///
/// ```ignore
/// let registry = ConnectorRegistry::with_builtin();
/// let connector = registry.create("elasticsearch", &settings, EventBus::new())?;
/// ```
#[derive(Default)]
pub struct ConnectorRegistry {
    factories: HashMap<String, ConnectorFactory>,
}

impl ConnectorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every connector shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ElasticsearchConnector::NAME, ElasticsearchConnector::factory);
        registry
    }

    /// Register a constructor, returning the one it replaces.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: ConnectorFactory,
    ) -> Option<ConnectorFactory> {
        self.factories.insert(name.into(), factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build the connector registered under `name`.
    pub fn create(
        &self,
        name: &str,
        settings: &ConnectionSettings,
        events: EventBus,
    ) -> Result<Arc<dyn Connector>, ConnectorError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ConnectorError::UnknownConnector(name.to_owned()))?;
        factory(settings, events)
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("connectors", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_factory(
        _: &ConnectionSettings,
        _: EventBus,
    ) -> Result<Arc<dyn Connector>, ConnectorError> {
        Err(ConnectorError::InvalidConfig("always fails".into()))
    }

    #[test]
    fn registry_starts_empty() {
        let registry = ConnectorRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.list().is_empty());
    }

    #[test]
    fn builtin_contains_elasticsearch() {
        let registry = ConnectorRegistry::with_builtin();
        assert!(registry.contains("elasticsearch"));
        assert_eq!(registry.list(), vec!["elasticsearch"]);
    }

    #[test]
    fn create_builds_named_connector() {
        let registry = ConnectorRegistry::with_builtin();
        let connector = registry
            .create("elasticsearch", &ConnectionSettings::default(), EventBus::new())
            .unwrap();
        assert_eq!(connector.name(), "elasticsearch");
        assert!(!connector.is_connected());
    }

    #[test]
    fn create_unknown_name_fails() {
        let registry = ConnectorRegistry::with_builtin();
        let err = registry
            .create("mongodb", &ConnectionSettings::default(), EventBus::new())
            .err()
            .expect("unknown connector should fail");
        assert!(matches!(err, ConnectorError::UnknownConnector(ref n) if n == "mongodb"));
    }

    #[test]
    fn register_replaces_existing() {
        let mut registry = ConnectorRegistry::with_builtin();
        let old = registry.register("elasticsearch", failing_factory);
        assert!(old.is_some());
        assert_eq!(registry.len(), 1);

        let result =
            registry.create("elasticsearch", &ConnectionSettings::default(), EventBus::new());
        assert!(matches!(result, Err(ConnectorError::InvalidConfig(_))));
    }

    #[test]
    fn registry_debug_shows_names() {
        let registry = ConnectorRegistry::with_builtin();
        let debug = format!("{registry:?}");
        assert!(debug.contains("elasticsearch"));
    }
}
