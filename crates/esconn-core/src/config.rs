//! Data source settings and the adapter configuration resolved from them.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use esconn_client::{ConnectionParams, LogLevel};

use crate::error::ConnectorError;

/// Raw settings supplied by the owning data source. Every field is optional.
///
/// Field names follow the data source settings object, so a JSON or TOML
/// block written for it deserializes directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSettings {
    /// Preferred over `host` when both are present.
    pub hostname: Option<String>,
    pub host: Option<String>,
    #[serde(default, deserialize_with = "port_from_number_or_string")]
    pub port: Option<u16>,
    /// Client log level name (`error`, `warning`, `info`, `debug`, `trace`).
    pub log: Option<String>,
    pub index: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub debug: Option<bool>,
    /// Per-request timeout in milliseconds.
    pub request_timeout: Option<u64>,
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Option::<Port>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Port::Number(n)) => Ok(Some(n)),
        Some(Port::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Port::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid port {s:?}"))),
    }
}

/// Adapter configuration. Immutable once the connector is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterConfig {
    pub host: String,
    pub port: u16,
    pub log_level: LogLevel,
    pub index_name: String,
    /// Empty when no default document type is configured.
    pub document_type: String,
    pub debug: bool,
    pub request_timeout: Duration,
}

impl AdapterConfig {
    pub const DEFAULT_INDEX: &str = "loopback";

    /// Resolve settings against the defaults.
    ///
    /// Empty strings and a zero port count as unset. The only failure is an
    /// unrecognised `log` value.
    pub fn resolve(settings: &ConnectionSettings) -> Result<Self, ConnectorError> {
        let host = non_empty(settings.hostname.as_deref())
            .or_else(|| non_empty(settings.host.as_deref()))
            .unwrap_or(ConnectionParams::DEFAULT_HOST)
            .to_owned();

        let port = settings
            .port
            .filter(|p| *p != 0)
            .unwrap_or(ConnectionParams::DEFAULT_PORT);

        let log_level = match non_empty(settings.log.as_deref()) {
            Some(raw) => raw
                .parse::<LogLevel>()
                .map_err(|e| ConnectorError::InvalidConfig(e.to_string()))?,
            None => LogLevel::default(),
        };

        let index_name = non_empty(settings.index.as_deref())
            .unwrap_or(Self::DEFAULT_INDEX)
            .to_owned();

        let document_type = settings.doc_type.clone().unwrap_or_default();

        let debug = settings
            .debug
            .unwrap_or_else(|| tracing::enabled!(tracing::Level::DEBUG));

        let request_timeout = settings
            .request_timeout
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(ConnectionParams::DEFAULT_REQUEST_TIMEOUT);

        Ok(Self {
            host,
            port,
            log_level,
            index_name,
            document_type,
            debug,
            request_timeout,
        })
    }

    /// The subset of the configuration the client handle needs.
    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams::new(self.host.clone(), self.port)
            .with_log(self.log_level)
            .with_request_timeout(self.request_timeout)
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            host: ConnectionParams::DEFAULT_HOST.to_owned(),
            port: ConnectionParams::DEFAULT_PORT,
            log_level: LogLevel::default(),
            index_name: Self::DEFAULT_INDEX.to_owned(),
            document_type: String::new(),
            debug: false,
            request_timeout: ConnectionParams::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}
