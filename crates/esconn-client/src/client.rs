use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use reqwest::{Method, Url};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::config::ConnectionParams;
use crate::error::ClientError;
use crate::models::{ClusterInfo, LogLevel};

/// A live session against one search-engine node.
///
/// Creating a handle performs no I/O; the first request is what reaches the
/// node. Each handle carries a unique id so callers can tell whether two
/// references point at the same session.
#[derive(Debug)]
pub struct ClientHandle {
    id: Uuid,
    created_at: DateTime<Utc>,
    base_url: Url,
    log: LogLevel,
    http: reqwest::Client,
    closed: AtomicBool,
}

impl ClientHandle {
    /// Build a handle for the given node.
    pub fn new(params: &ConnectionParams) -> Result<Self, ClientError> {
        let raw = params.base_url();
        let base_url = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(params.request_timeout)
            .user_agent(concat!("esconn/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Build)?;

        let handle = Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            base_url,
            log: params.log,
            http,
            closed: AtomicBool::new(false),
        };

        if handle.log.admits(LogLevel::Debug) {
            debug!(
                handle_id = %handle.id,
                url = %handle.base_url,
                created_at = %handle.created_at,
                "client handle created"
            );
        }
        Ok(handle)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn log_level(&self) -> LogLevel {
        self.log
    }

    /// Liveness probe: `HEAD /`.
    ///
    /// Resolves to `true` on any 2xx answer.
    pub async fn ping(&self) -> Result<bool, ClientError> {
        self.send(Method::HEAD, "").await?;
        Ok(true)
    }

    /// Fetch node and cluster identity: `GET /`.
    pub async fn info(&self) -> Result<ClusterInfo, ClientError> {
        let response = self.send(Method::GET, "").await?;
        let url = response.url().to_string();
        response
            .json::<ClusterInfo>()
            .await
            .map_err(|source| ClientError::Decode { url, source })
    }

    /// Release the session. Later requests fail with [`ClientError::Closed`].
    ///
    /// Returns `false` if the handle was already closed.
    pub fn close(&self) -> bool {
        let was_open = !self.closed.swap(true, Ordering::SeqCst);
        if was_open && self.log.admits(LogLevel::Debug) {
            debug!(handle_id = %self.id, "client handle closed");
        }
        was_open
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn send(&self, method: Method, path: &str) -> Result<reqwest::Response, ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        let url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })?;

        self.trace_request(&method, &url);

        let response = match self.http.request(method.clone(), url.clone()).send().await {
            Ok(response) => response,
            Err(source) => {
                self.report_failure(&method, &url, &source.to_string());
                return Err(ClientError::Request {
                    url: url.to_string(),
                    source,
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            self.report_failure(&method, &url, &format!("HTTP {status}"));
            return Err(ClientError::UnexpectedStatus {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if self.log.admits(LogLevel::Trace) {
            trace!(handle_id = %self.id, %method, %url, status = status.as_u16(), "response");
        }
        Ok(response)
    }

    fn trace_request(&self, method: &Method, url: &Url) {
        if self.log.admits(LogLevel::Trace) {
            trace!(handle_id = %self.id, %method, %url, "request");
        } else if self.log.admits(LogLevel::Debug) {
            debug!(handle_id = %self.id, %method, %url, "request");
        } else if self.log.admits(LogLevel::Info) {
            info!(%method, %url, "request");
        }
    }

    fn report_failure(&self, method: &Method, url: &Url, reason: &str) {
        if self.log.admits(LogLevel::Warning) {
            warn!(handle_id = %self.id, %method, %url, reason, "request failed");
        } else {
            error!(handle_id = %self.id, %method, %url, reason, "request failed");
        }
    }
}
