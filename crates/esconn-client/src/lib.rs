//! Outbound client for a single Elasticsearch node.
//!
//! A [`ClientHandle`] is a cheap, lazily-connecting session: constructing one
//! validates the node address and builds the HTTP client, but no request is
//! sent until [`ClientHandle::ping`] or [`ClientHandle::info`] is called.

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::ClientHandle;
pub use config::ConnectionParams;
pub use error::ClientError;
pub use models::{ClusterInfo, ClusterVersion, LogLevel, LogLevelParseError};
