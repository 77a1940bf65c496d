//! The `Connector` trait -- the data-access contract a backing store implements.
//!
//! The trait is object-safe so connectors can be handed around as
//! `Arc<dyn Connector>` by the [`super::ConnectorRegistry`] and
//! [`crate::DataSource`].

use async_trait::async_trait;
use serde_json::Value;

use super::types::Filter;
use crate::error::ConnectorError;

/// Adapter interface between a data source and a backing store.
///
/// The lifecycle methods (`connect`, `disconnect`, `ping`) manage the
/// session; the remaining methods are the record operations. A connector
/// that does not support an operation returns
/// [`ConnectorError::NotImplemented`] instead of an empty success.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Registry name (e.g. "elasticsearch").
    fn name(&self) -> &str;

    /// Static tags describing the class of store, independent of settings.
    fn capabilities(&self) -> &[&'static str];

    /// Establish the session if it does not exist yet.
    async fn connect(&self) -> Result<(), ConnectorError>;

    /// Release the session, if any.
    fn disconnect(&self);

    fn is_connected(&self) -> bool;

    /// Liveness probe, connecting first when needed.
    async fn ping(&self) -> Result<bool, ConnectorError>;

    /// Count records of `model` matching an optional where clause.
    async fn count(&self, model: &str, where_clause: Option<&Value>)
    -> Result<u64, ConnectorError>;

    async fn exists(&self, model: &str, id: &str) -> Result<bool, ConnectorError>;

    async fn find(&self, model: &str, id: &str) -> Result<Option<Value>, ConnectorError>;

    /// Delete one record. Resolves to whether a record was removed.
    async fn destroy(&self, model: &str, id: &str) -> Result<bool, ConnectorError>;

    async fn all(&self, model: &str, filter: &Filter) -> Result<Vec<Value>, ConnectorError>;

    /// Insert a record and return its id.
    async fn create(&self, model: &str, data: Value) -> Result<String, ConnectorError>;

    async fn update_or_create(&self, model: &str, data: Value) -> Result<Value, ConnectorError>;

    /// Replace the record stored under `id`.
    async fn save(&self, model: &str, id: &str, data: Value) -> Result<Value, ConnectorError>;

    /// Merge `data` into the record stored under `id`.
    async fn update_attributes(
        &self,
        model: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, ConnectorError>;
}

// Compile-time assertion: Connector must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Connector) {}
};
