//! Connector contract between a data source and a backing store.
//!
//! ```text
//! DataSource
//!     |
//!     v
//! ConnectorRegistry --create("elasticsearch")--> Arc<dyn Connector>
//!                                                     |
//!                      connect / disconnect / ping ---+
//!                      count / find / all / create ... (record operations)
//! ```

pub mod registry;
pub mod trait_def;
pub mod types;

pub use registry::{ConnectorFactory, ConnectorRegistry};
pub use trait_def::Connector;
pub use types::Filter;
