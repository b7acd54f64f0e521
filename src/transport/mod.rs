//! Transport abstraction for the telemetry connection.
//!
//! A transport owns the socket and its recovery policy. The client only ever
//! sees a [`Session`]: a stream of [`TransportEvent`]s coming in and a queue
//! of outgoing [`Outbound`] commands. Whenever the underlying connection becomes live
//! (first time or after a reconnect) the transport delivers
//! [`TransportEvent::Connect`].
//!
//! - [`TcpConnector`]: newline-delimited JSON over TCP, reconnecting after a
//!   fixed delay
//! - [`memory`]: an in-process connector driven by a [`memory::ServerHandle`],
//!   used by tests and demos

pub mod memory;
mod tcp;

pub use tcp::TcpConnector;

use std::fmt::Debug;

use serde_json::Value;
use telewatch_types::Envelope;
use tokio::sync::mpsc;

/// Capacity of the inbound event queue between a transport and its client.
pub(crate) const EVENT_BUFFER: usize = 16;

/// Something that happened on the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The session became live. Fires again after every reconnect.
    Connect,
    /// The session was lost. The transport decides whether and when to reconnect.
    Disconnect {
        /// Human-readable cause.
        reason: String,
    },
    /// A named event pushed by the server.
    Message {
        /// Event name.
        event: String,
        /// Event payload (`Null` when absent).
        payload: Value,
    },
}

impl From<Envelope> for TransportEvent {
    fn from(envelope: Envelope) -> Self {
        TransportEvent::Message {
            event: envelope.event,
            payload: envelope.data,
        }
    }
}

/// A command stamped with the connection it belongs to.
///
/// Connections are numbered by counting [`TransportEvent::Connect`]s from 1.
/// A transport drops commands stamped for an earlier connection, so a reply
/// to an event from a lost socket never reaches its successor.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    /// `Connect` events the sender had seen when it queued the command.
    pub connection: u64,
    /// The command itself.
    pub envelope: Envelope,
}

impl Outbound {
    pub fn new(connection: u64, envelope: Envelope) -> Self {
        Self {
            connection,
            envelope,
        }
    }
}

/// The client's end of one transport connection.
#[derive(Debug)]
pub struct Session {
    /// Inbound events, in delivery order.
    pub events: mpsc::Receiver<TransportEvent>,
    /// Outbound commands. Never blocks the sender.
    pub commands: mpsc::UnboundedSender<Outbound>,
}

/// Opens transport connections.
///
/// `open` must be called from within a tokio runtime; implementations spawn
/// the task that owns the socket and return immediately.
pub trait Connector: Send + Sync + Debug + 'static {
    /// Open one connection.
    fn open(&self) -> Session;

    /// Returns a human-readable description of the endpoint.
    ///
    /// Used for display in the TUI header.
    fn description(&self) -> String;
}
