use std::sync::Arc;

use thiserror::Error;

use esconn_client::ClientError;

/// Errors surfaced by connectors and data sources.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The operation is part of the connector contract but has no
    /// implementation in this connector.
    #[error("{operation} is not implemented by the {connector} connector")]
    NotImplemented {
        connector: &'static str,
        operation: &'static str,
    },

    /// Creating the client handle failed. Shared because the same failure is
    /// also broadcast to every listener on the event bus.
    #[error("failed to create client handle")]
    Connect(#[source] Arc<ClientError>),

    /// A request on an established handle failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// No connector is registered under this name.
    #[error("unknown connector {0:?}")]
    UnknownConnector(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The connection event channel was closed while waiting on it.
    #[error("connection event channel closed")]
    EventsClosed,
}

impl ConnectorError {
    pub fn not_implemented(connector: &'static str, operation: &'static str) -> Self {
        Self::NotImplemented {
            connector,
            operation,
        }
    }

    /// True when the error marks a missing operation rather than a failure.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }
}
