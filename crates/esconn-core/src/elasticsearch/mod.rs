//! Elasticsearch connector.
//!
//! Session management is complete: the client handle is created lazily,
//! reused until disconnect, and probed with `ping`. Record operations are
//! not implemented and fail with [`ConnectorError::NotImplemented`]. In
//! particular there is no translation of where clauses into the engine's
//! query DSL.

mod search;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use esconn_client::ClientHandle;

pub use search::SearchTarget;

use crate::config::{AdapterConfig, ConnectionSettings};
use crate::connector::{Connector, Filter};
use crate::error::ConnectorError;
use crate::events::EventBus;
use crate::manager::ConnectionManager;

/// Connector for a single Elasticsearch node.
#[derive(Debug)]
pub struct ElasticsearchConnector {
    config: Arc<AdapterConfig>,
    manager: ConnectionManager,
}

impl ElasticsearchConnector {
    pub const NAME: &str = "elasticsearch";

    pub const CAPABILITIES: [&'static str; 3] = ["db", "nosql", "elasticsearch"];

    /// Resolve `settings` and build the connector. Does not connect.
    pub fn new(settings: &ConnectionSettings, events: EventBus) -> Result<Self, ConnectorError> {
        let config = AdapterConfig::resolve(settings)?;
        if config.debug {
            debug!(?settings, "elasticsearch connector settings");
        }
        Ok(Self::with_config(config, events))
    }

    pub fn with_config(config: AdapterConfig, events: EventBus) -> Self {
        let manager = ConnectionManager::new(config.connection_params(), events);
        Self {
            config: Arc::new(config),
            manager,
        }
    }

    /// [`crate::connector::ConnectorFactory`] entry for the registry.
    pub fn factory(
        settings: &ConnectionSettings,
        events: EventBus,
    ) -> Result<Arc<dyn Connector>, ConnectorError> {
        Ok(Arc::new(Self::new(settings, events)?))
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn index(&self) -> &str {
        &self.config.index_name
    }

    pub fn doc_type(&self) -> &str {
        &self.config.document_type
    }

    /// The client handle, created on first use.
    pub async fn handle(&self) -> Result<Arc<ClientHandle>, ConnectorError> {
        self.manager.connect().await
    }

    /// Where requests for `model` go: the configured index, with the model
    /// name as document type (or the configured type without a model).
    pub fn build_search(&self, model: Option<&str>) -> SearchTarget {
        SearchTarget::resolve(&self.config.index_name, &self.config.document_type, model)
    }

    fn unsupported(&self, operation: &'static str, model: &str) -> ConnectorError {
        let target = self.build_search(Some(model));
        debug!(
            operation,
            index = %target.index,
            doc_type = %target.doc_type,
            "operation not implemented"
        );
        ConnectorError::not_implemented(Self::NAME, operation)
    }
}

#[async_trait]
impl Connector for ElasticsearchConnector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> &[&'static str] {
        &Self::CAPABILITIES
    }

    async fn connect(&self) -> Result<(), ConnectorError> {
        self.manager.connect().await.map(|_| ())
    }

    fn disconnect(&self) {
        if self.config.debug {
            debug!(index = %self.config.index_name, "disconnect");
        }
        self.manager.disconnect();
    }

    fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    async fn ping(&self) -> Result<bool, ConnectorError> {
        self.manager.ping().await
    }

    async fn count(&self, model: &str, _: Option<&Value>) -> Result<u64, ConnectorError> {
        Err(self.unsupported("count", model))
    }

    async fn exists(&self, model: &str, _: &str) -> Result<bool, ConnectorError> {
        Err(self.unsupported("exists", model))
    }

    async fn find(&self, model: &str, _: &str) -> Result<Option<Value>, ConnectorError> {
        Err(self.unsupported("find", model))
    }

    async fn destroy(&self, model: &str, _: &str) -> Result<bool, ConnectorError> {
        Err(self.unsupported("destroy", model))
    }

    async fn all(&self, model: &str, _: &Filter) -> Result<Vec<Value>, ConnectorError> {
        Err(self.unsupported("all", model))
    }

    async fn create(&self, model: &str, _: Value) -> Result<String, ConnectorError> {
        Err(self.unsupported("create", model))
    }

    async fn update_or_create(&self, model: &str, _: Value) -> Result<Value, ConnectorError> {
        Err(self.unsupported("update_or_create", model))
    }

    async fn save(&self, model: &str, _: &str, _: Value) -> Result<Value, ConnectorError> {
        Err(self.unsupported("save", model))
    }

    async fn update_attributes(
        &self,
        model: &str,
        _: &str,
        _: Value,
    ) -> Result<Value, ConnectorError> {
        Err(self.unsupported("update_attributes", model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector(settings: ConnectionSettings) -> ElasticsearchConnector {
        ElasticsearchConnector::new(&settings, EventBus::new()).unwrap()
    }

    #[test]
    fn capabilities_are_fixed() {
        let default = connector(ConnectionSettings::default());
        let custom = connector(ConnectionSettings {
            host: Some("elsewhere".into()),
            index: Some("other".into()),
            doc_type: Some("thing".into()),
            ..Default::default()
        });
        assert_eq!(default.capabilities(), ["db", "nosql", "elasticsearch"]);
        assert_eq!(default.capabilities(), custom.capabilities());
    }

    #[test]
    fn index_and_type_follow_settings() {
        let c = connector(ConnectionSettings {
            index: Some("products".into()),
            doc_type: Some("item".into()),
            ..Default::default()
        });
        assert_eq!(c.index(), "products");
        assert_eq!(c.doc_type(), "item");
        assert_eq!(c.build_search(None).doc_type, "item");
        assert_eq!(c.build_search(Some("Order")).doc_type, "Order");
        assert_eq!(c.build_search(Some("Order")).index, "products");
    }

    #[test]
    fn invalid_log_level_rejects_construction() {
        let result = ElasticsearchConnector::new(
            &ConnectionSettings {
                log: Some("loud".into()),
                ..Default::default()
            },
            EventBus::new(),
        );
        assert!(matches!(result, Err(ConnectorError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn handle_is_shared_with_manager() {
        let c = connector(ConnectionSettings::default());
        let handle = c.handle().await.unwrap();
        let current = c.manager().current().unwrap();
        assert!(Arc::ptr_eq(&handle, &current));
        assert!(c.is_connected());

        c.disconnect();
        assert!(!c.is_connected());
        assert!(handle.is_closed());
    }
}
