//! A named data source bound to one connector.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::ConnectionSettings;
use crate::connector::{Connector, ConnectorRegistry};
use crate::error::ConnectorError;
use crate::events::{ConnectionEvent, EventBus};

/// Settings, connector and connection event bus for one backing store.
pub struct DataSource {
    connector_name: String,
    settings: ConnectionSettings,
    events: EventBus,
    connector: Arc<dyn Connector>,
}

impl DataSource {
    /// Build the data source and its connector without connecting.
    pub fn new(
        registry: &ConnectorRegistry,
        connector_name: &str,
        settings: ConnectionSettings,
    ) -> Result<Self, ConnectorError> {
        let events = EventBus::new();
        let connector = registry.create(connector_name, &settings, events.clone())?;
        Ok(Self {
            connector_name: connector_name.to_owned(),
            settings,
            events,
            connector,
        })
    }

    /// Build the data source and connect it.
    pub async fn initialize(
        registry: &ConnectorRegistry,
        connector_name: &str,
        settings: ConnectionSettings,
    ) -> Result<Self, ConnectorError> {
        let source = Self::new(registry, connector_name, settings)?;
        source.connect().await?;
        Ok(source)
    }

    pub fn connector_name(&self) -> &str {
        &self.connector_name
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn connector(&self) -> &dyn Connector {
        self.connector.as_ref()
    }

    /// Receive `Connected`, `Failed` and `Disconnected` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    pub fn capabilities(&self) -> &[&'static str] {
        self.connector.capabilities()
    }

    pub fn is_connected(&self) -> bool {
        self.connector.is_connected()
    }

    pub async fn connect(&self) -> Result<(), ConnectorError> {
        match self.connector.connect().await {
            Ok(()) => {
                info!(connector = %self.connector_name, "data source connected");
                Ok(())
            }
            Err(err) => {
                warn!(connector = %self.connector_name, error = %err, "data source failed to connect");
                Err(err)
            }
        }
    }

    pub fn disconnect(&self) {
        self.connector.disconnect();
    }

    pub async fn ping(&self) -> Result<bool, ConnectorError> {
        self.connector.ping().await
    }
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("connector", &self.connector_name)
            .field("settings", &self.settings)
            .field("connected", &self.is_connected())
            .finish()
    }
}
