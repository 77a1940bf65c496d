//! Connection lifecycle notifications shared between a data source and its
//! connector.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{trace, warn};
use uuid::Uuid;

use esconn_client::ClientError;

use crate::error::ConnectorError;

/// A change in connection state.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// A new client handle was created.
    Connected { handle_id: Uuid },
    /// Creating a client handle failed.
    Failed(Arc<ClientError>),
    /// The handle was released.
    Disconnected { handle_id: Uuid },
}

/// Broadcast channel for [`ConnectionEvent`]s.
///
/// Cloning yields another sender onto the same channel. Events emitted while
/// nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ConnectionEvent>,
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 16;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn emit(&self, event: ConnectionEvent) {
        let delivered = self.tx.send(event).unwrap_or(0);
        trace!(delivered, "connection event emitted");
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for whichever of `Connected` or `Failed` arrives first.
///
/// `Disconnected` events are skipped. Returns the new handle's id, or the
/// connection failure.
///
/// A lagging receiver may have lost the event it waits for, so on lag
/// `current` is consulted and a handle it reports counts as connected.
pub async fn next_outcome<F>(
    rx: &mut broadcast::Receiver<ConnectionEvent>,
    current: F,
) -> Result<Uuid, ConnectorError>
where
    F: Fn() -> Option<Uuid>,
{
    loop {
        match rx.recv().await {
            Ok(ConnectionEvent::Connected { handle_id }) => return Ok(handle_id),
            Ok(ConnectionEvent::Failed(err)) => return Err(ConnectorError::Connect(err)),
            Ok(ConnectionEvent::Disconnected { .. }) => continue,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "connection listener lagged behind");
                if let Some(handle_id) = current() {
                    return Ok(handle_id);
                }
            }
            Err(RecvError::Closed) => return Err(ConnectorError::EventsClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connected_resolves_outcome() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let id = Uuid::new_v4();

        bus.emit(ConnectionEvent::Connected { handle_id: id });
        assert_eq!(next_outcome(&mut rx, || None).await.unwrap(), id);
    }

    #[tokio::test]
    async fn failure_resolves_outcome_as_error() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(ConnectionEvent::Failed(Arc::new(ClientError::Closed)));
        let err = next_outcome(&mut rx, || None).await.unwrap_err();
        assert!(matches!(err, ConnectorError::Connect(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn first_outcome_wins() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let id = Uuid::new_v4();

        bus.emit(ConnectionEvent::Disconnected {
            handle_id: Uuid::new_v4(),
        });
        bus.emit(ConnectionEvent::Connected { handle_id: id });
        bus.emit(ConnectionEvent::Failed(Arc::new(ClientError::Closed)));

        assert_eq!(next_outcome(&mut rx, || None).await.unwrap(), id);
    }

    #[tokio::test]
    async fn closed_channel_is_an_error() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        drop(bus);

        let err = next_outcome(&mut rx, || None).await.unwrap_err();
        assert!(matches!(err, ConnectorError::EventsClosed));
    }

    #[tokio::test]
    async fn lagged_receiver_falls_back_to_current_handle() {
        let bus = EventBus::with_capacity(1);
        let mut rx = bus.subscribe();
        let id = Uuid::new_v4();

        // Capacity 1: the Connected event is overwritten before it is read.
        bus.emit(ConnectionEvent::Connected { handle_id: id });
        bus.emit(ConnectionEvent::Disconnected {
            handle_id: Uuid::new_v4(),
        });

        assert_eq!(next_outcome(&mut rx, || Some(id)).await.unwrap(), id);
    }

    #[tokio::test]
    async fn lag_without_handle_keeps_waiting() {
        let bus = EventBus::with_capacity(1);
        let mut rx = bus.subscribe();
        let id = Uuid::new_v4();

        bus.emit(ConnectionEvent::Disconnected {
            handle_id: Uuid::new_v4(),
        });
        bus.emit(ConnectionEvent::Disconnected {
            handle_id: Uuid::new_v4(),
        });
        let waiter = tokio::spawn(async move { next_outcome(&mut rx, || None).await });
        tokio::task::yield_now().await;
        bus.emit(ConnectionEvent::Connected { handle_id: id });

        assert_eq!(waiter.await.unwrap().unwrap(), id);
    }

    #[test]
    fn emit_without_listeners_is_dropped() {
        let bus = EventBus::new();
        assert_eq!(bus.listener_count(), 0);
        bus.emit(ConnectionEvent::Connected {
            handle_id: Uuid::nil(),
        });
    }

    #[test]
    fn dropping_receiver_releases_listener() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        assert_eq!(bus.listener_count(), 1);
        drop(rx);
        assert_eq!(bus.listener_count(), 0);
    }
}
