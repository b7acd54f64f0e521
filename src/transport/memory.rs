//! In-process transport.
//!
//! [`pair`] returns a connector for the client and a [`ServerHandle`] that
//! plays the server: it fires transport events and observes the commands the
//! client emits. Useful for tests and for driving the dashboard without a
//! robot on the network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use telewatch_types::{event, Envelope};
use tokio::sync::mpsc;
use tracing::warn;

use super::{Connector, Outbound, Session, TransportEvent, EVENT_BUFFER};

/// Create a connected connector/server pair.
///
/// # Example
///
/// ```
/// use telewatch::transport::{memory, Connector};
///
/// # tokio_test::block_on(async {
/// let (connector, server) = memory::pair();
/// let _session = connector.open();
/// assert_eq!(server.opens(), 1);
/// # });
/// ```
pub fn pair() -> (MemoryConnector, ServerHandle) {
    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let opens = Arc::new(AtomicUsize::new(0));

    let connector = MemoryConnector {
        session: Mutex::new(Some(Session {
            events: event_rx,
            commands: command_tx,
        })),
        opens: opens.clone(),
    };
    let server = ServerHandle {
        events: event_tx,
        commands: command_rx,
        opens,
    };
    (connector, server)
}

/// The client half of an in-process transport.
///
/// Only the first `open` is wired to the [`ServerHandle`]; later calls get a
/// session that is already closed.
#[derive(Debug)]
pub struct MemoryConnector {
    session: Mutex<Option<Session>>,
    opens: Arc<AtomicUsize>,
}

impl Connector for MemoryConnector {
    fn open(&self) -> Session {
        self.opens.fetch_add(1, Ordering::SeqCst);
        match self.session.lock().take() {
            Some(session) => session,
            None => {
                warn!("memory transport opened more than once; returning a closed session");
                let (_, events) = mpsc::channel(1);
                let (commands, _) = mpsc::unbounded_channel();
                Session { events, commands }
            }
        }
    }

    fn description(&self) -> String {
        "memory".to_string()
    }
}

/// The server half of an in-process transport.
#[derive(Debug)]
pub struct ServerHandle {
    events: mpsc::Sender<TransportEvent>,
    commands: mpsc::UnboundedReceiver<Outbound>,
    opens: Arc<AtomicUsize>,
}

impl ServerHandle {
    /// How many times the connector has been opened.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Deliver a raw transport event. Returns false once the client is gone.
    pub async fn fire(&self, event: TransportEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// Mark the session live.
    pub async fn connect(&self) -> bool {
        self.fire(TransportEvent::Connect).await
    }

    /// Mark the session lost.
    pub async fn disconnect(&self, reason: &str) -> bool {
        self.fire(TransportEvent::Disconnect {
            reason: reason.to_string(),
        })
        .await
    }

    /// Push a named server event.
    pub async fn send(&self, name: &str, payload: Value) -> bool {
        self.fire(TransportEvent::Message {
            event: name.to_string(),
            payload,
        })
        .await
    }

    /// Acknowledge a subscription.
    pub async fn subscribed(&self) -> bool {
        self.send(event::SUBSCRIBED, Value::Null).await
    }

    /// Push one telemetry frame as its text encoding.
    pub async fn telemetry(&self, text: &str) -> bool {
        self.send(event::TELEMETRY_DATA, Value::String(text.to_string())).await
    }

    /// Wait for the next command emitted by the client.
    pub async fn next_command(&mut self) -> Option<Envelope> {
        self.commands.recv().await.map(|outbound| outbound.envelope)
    }

    /// Take a command the client has already emitted, if any.
    pub fn try_next_command(&mut self) -> Option<Envelope> {
        self.commands.try_recv().ok().map(|outbound| outbound.envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_open_is_wired() {
        let (connector, mut server) = pair();
        let mut session = connector.open();

        assert!(server.connect().await);
        assert_eq!(session.events.recv().await, Some(TransportEvent::Connect));

        session.commands.send(Outbound::new(1, Envelope::bare("ping"))).unwrap();
        assert_eq!(server.next_command().await, Some(Envelope::bare("ping")));
        assert!(server.try_next_command().is_none());
    }

    #[tokio::test]
    async fn test_second_open_is_closed() {
        let (connector, server) = pair();
        let _first = connector.open();
        let mut second = connector.open();

        assert_eq!(second.events.recv().await, None);
        assert!(second.commands.send(Outbound::new(1, Envelope::bare("ping"))).is_err());
        assert_eq!(server.opens(), 2);
    }
}
