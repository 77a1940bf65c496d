//! Data source connectors with lazily managed sessions.
//!
//! A [`DataSource`] names a connector from the [`ConnectorRegistry`] and owns
//! the [`EventBus`] its connector reports connection changes on. The
//! [`ElasticsearchConnector`] keeps a single client handle through a
//! [`ConnectionManager`].

pub mod config;
pub mod connector;
pub mod datasource;
pub mod elasticsearch;
pub mod error;
pub mod events;
pub mod manager;

pub use config::{AdapterConfig, ConnectionSettings};
pub use connector::{Connector, ConnectorRegistry, Filter};
pub use datasource::DataSource;
pub use elasticsearch::{ElasticsearchConnector, SearchTarget};
pub use error::ConnectorError;
pub use events::{ConnectionEvent, EventBus};
pub use manager::ConnectionManager;

pub use esconn_client::{ClientError, ClientHandle, LogLevel};
