use thiserror::Error;

/// Errors raised by a [`crate::ClientHandle`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Host and port do not form a valid URL.
    #[error("invalid node URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Build(#[source] reqwest::Error),

    /// The request never produced a response (refused, timed out, reset).
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The node answered with a non-success status.
    #[error("{method} {url} returned HTTP {status}")]
    UnexpectedStatus {
        method: String,
        url: String,
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The handle was released by a disconnect.
    #[error("client handle is closed")]
    Closed,
}
