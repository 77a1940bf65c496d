use std::time::Duration;

use crate::models::LogLevel;

/// Parameters handed to the search-engine client when a handle is created.
///
/// Only one node is addressed; the handle talks to `http://<hostname>:<port>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Host name or IP address of the node.
    pub hostname: String,
    /// HTTP port of the node.
    pub port: u16,
    /// Verbosity of the client's own request tracing.
    pub log: LogLevel,
    /// Upper bound for a single request, connect included.
    pub request_timeout: Duration,
}

impl ConnectionParams {
    /// Host used when none is configured.
    pub const DEFAULT_HOST: &str = "127.0.0.1";

    /// Port used when none is configured.
    pub const DEFAULT_PORT: u16 = 9200;

    /// Request timeout used when none is configured.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Build params for an explicit host and port with default log level and
    /// timeout.
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            log: LogLevel::default(),
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_log(mut self, log: LogLevel) -> Self {
        self.log = log;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Root URL of the node, without a trailing slash.
    ///
    /// IPv6 literals are bracketed.
    pub fn base_url(&self) -> String {
        if self.hostname.contains(':') && !self.hostname.starts_with('[') {
            format!("http://[{}]:{}", self.hostname, self.port)
        } else {
            format!("http://{}:{}", self.hostname, self.port)
        }
    }
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HOST, Self::DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = ConnectionParams::default();
        assert_eq!(params.hostname, "127.0.0.1");
        assert_eq!(params.port, 9200);
        assert_eq!(params.log, LogLevel::Warning);
        assert_eq!(params.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn base_url_from_host_and_port() {
        let params = ConnectionParams::new("search.internal", 9201);
        assert_eq!(params.base_url(), "http://search.internal:9201");
    }

    #[test]
    fn base_url_brackets_ipv6() {
        let params = ConnectionParams::new("::1", 9200);
        assert_eq!(params.base_url(), "http://[::1]:9200");
    }

    #[test]
    fn builder_overrides() {
        let params = ConnectionParams::new("localhost", 9200)
            .with_log(LogLevel::Trace)
            .with_request_timeout(Duration::from_millis(250));
        assert_eq!(params.log, LogLevel::Trace);
        assert_eq!(params.request_timeout, Duration::from_millis(250));
    }
}
