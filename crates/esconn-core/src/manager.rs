//! Lazily-created, single client handle per connector.
//!
//! ```text
//!             connect()                 disconnect()
//!   (empty) ------------> (handle) ---------------------> (empty)
//!      |                     |  connect(): same handle,
//!      |                     |  returned on a later turn
//!      +-- ping(): subscribe, connect, await Connected | Failed, probe
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use esconn_client::{ClientError, ClientHandle, ConnectionParams};

use crate::error::ConnectorError;
use crate::events::{ConnectionEvent, EventBus, next_outcome};

/// Owns at most one [`ClientHandle`] and hands out shared references to it.
#[derive(Debug)]
pub struct ConnectionManager {
    params: ConnectionParams,
    slot: Mutex<Option<Arc<ClientHandle>>>,
    events: EventBus,
}

impl ConnectionManager {
    pub fn new(params: ConnectionParams, events: EventBus) -> Self {
        Self {
            params,
            slot: Mutex::new(None),
            events,
        }
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The stored handle, without connecting.
    pub fn current(&self) -> Option<Arc<ClientHandle>> {
        self.lock().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_some()
    }

    /// Return the handle, creating it on first use.
    ///
    /// An existing handle is returned only after yielding to the scheduler
    /// once, so callers never see this complete inline for an
    /// already-resolved handle.
    pub async fn connect(&self) -> Result<Arc<ClientHandle>, ConnectorError> {
        if let Some(handle) = self.current() {
            tokio::task::yield_now().await;
            return Ok(handle);
        }
        self.establish()
    }

    fn establish(&self) -> Result<Arc<ClientHandle>, ConnectorError> {
        let mut slot = self.lock();
        // Lost a race with another caller; reuse its handle.
        if let Some(handle) = slot.as_ref() {
            return Ok(Arc::clone(handle));
        }

        match ClientHandle::new(&self.params) {
            Ok(handle) => {
                let handle = Arc::new(handle);
                *slot = Some(Arc::clone(&handle));
                drop(slot);

                info!(
                    host = %self.params.hostname,
                    port = self.params.port,
                    handle_id = %handle.id(),
                    "client handle created"
                );
                self.events.emit(ConnectionEvent::Connected {
                    handle_id: handle.id(),
                });
                Ok(handle)
            }
            Err(err) => {
                drop(slot);

                warn!(
                    host = %self.params.hostname,
                    port = self.params.port,
                    error = %err,
                    "failed to create client handle"
                );
                let err = Arc::new(err);
                self.events.emit(ConnectionEvent::Failed(Arc::clone(&err)));
                Err(ConnectorError::Connect(err))
            }
        }
    }

    /// Close and forget the handle. A later [`connect`](Self::connect)
    /// creates a fresh one.
    ///
    /// Returns `false` when there was nothing to release.
    pub fn disconnect(&self) -> bool {
        let Some(handle) = self.lock().take() else {
            debug!("disconnect with no client handle");
            return false;
        };

        handle.close();
        info!(handle_id = %handle.id(), "client handle released");
        self.events.emit(ConnectionEvent::Disconnected {
            handle_id: handle.id(),
        });
        true
    }

    /// Liveness probe, connecting first if needed.
    ///
    /// Without a handle this subscribes to the event bus, triggers
    /// [`connect`](Self::connect), and lets the first `Connected` or `Failed`
    /// event decide between probing and failing. The subscription is dropped
    /// on return either way.
    pub async fn ping(&self) -> Result<bool, ConnectorError> {
        if let Some(handle) = self.current() {
            return Ok(handle.ping().await?);
        }

        let mut events = self.events.subscribe();
        // A handle may have appeared before the subscription existed, in
        // which case no Connected event is coming.
        if let Some(handle) = self.current() {
            drop(events);
            return Ok(handle.ping().await?);
        }

        // The outcome is read from the bus, not from this result.
        let _ = self.connect().await;
        next_outcome(&mut events, || self.current().map(|h| h.id())).await?;
        drop(events);

        let handle = self.current().ok_or(ClientError::Closed)?;
        Ok(handle.ping().await?)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<ClientHandle>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConnectionManager {
        ConnectionManager::new(ConnectionParams::default(), EventBus::new())
    }

    #[tokio::test]
    async fn connect_creates_handle_once() {
        let mgr = manager();
        assert!(!mgr.is_connected());

        let first = mgr.connect().await.unwrap();
        let second = mgr.connect().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.id(), second.id());
        assert!(mgr.is_connected());
    }

    #[tokio::test]
    async fn connect_emits_connected_only_on_creation() {
        let mgr = manager();
        let mut rx = mgr.events().subscribe();

        let handle = mgr.connect().await.unwrap();
        mgr.connect().await.unwrap();

        match rx.try_recv().unwrap() {
            ConnectionEvent::Connected { handle_id } => assert_eq!(handle_id, handle.id()),
            other => panic!("expected Connected, got {other:?}"),
        }
        assert!(rx.try_recv().is_err(), "second connect must not emit");
    }

    #[tokio::test]
    async fn disconnect_clears_and_closes() {
        let mgr = manager();
        let first = mgr.connect().await.unwrap();

        assert!(mgr.disconnect());
        assert!(first.is_closed());
        assert!(mgr.current().is_none());
        assert!(!mgr.disconnect());

        let second = mgr.connect().await.unwrap();
        assert_ne!(first.id(), second.id());
        assert!(!second.is_closed());
    }

    #[tokio::test]
    async fn invalid_host_fails_and_broadcasts() {
        let mgr = ConnectionManager::new(
            ConnectionParams::new("not a host", 9200),
            EventBus::new(),
        );
        let mut rx = mgr.events().subscribe();

        let err = mgr.connect().await.unwrap_err();
        assert!(matches!(err, ConnectorError::Connect(_)), "got {err:?}");
        assert!(!mgr.is_connected());
        assert!(matches!(rx.try_recv().unwrap(), ConnectionEvent::Failed(_)));
    }

    #[tokio::test]
    async fn ping_relays_connect_failure() {
        let mgr = ConnectionManager::new(
            ConnectionParams::new("not a host", 9200),
            EventBus::new(),
        );

        let err = mgr.ping().await.unwrap_err();
        assert!(matches!(err, ConnectorError::Connect(_)), "got {err:?}");
        assert_eq!(mgr.events().listener_count(), 0);
    }
}
