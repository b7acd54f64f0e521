//! Subscription handshake state machine.
//!
//! Pure and synchronous: each transport event goes in, at most one [`Step`]
//! comes out. The driver task in [`super`] performs the step and reports
//! emitted commands back through [`Handshake::sent`].
//!
//! ```text
//!  Disconnected ──open──▶ Connecting ──connect──▶ Connected
//!                             ▲                       │ emit subscribe
//!                             │                       ▼
//!                        disconnect          SubscriptionRequested
//!                             │                       │ subscribed
//!                             │                       ▼
//!                             └──────────────── Subscribed ─▶ Streaming
//!                                               emit request_data
//! ```

use std::fmt;

use serde_json::Value;
use telewatch_types::{event, RefreshRate, TelemetryData, Topics};
use tracing::debug;

use super::codec::{decode_frame, ClientCommand};
use crate::error::ClientError;
use crate::transport::TransportEvent;

/// Where the client is in the subscription handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// No connection, or the transport has shut down.
    #[default]
    Disconnected,
    /// Waiting for the transport to come up.
    Connecting,
    /// Transport is live; subscription not yet sent.
    Connected,
    /// `subscribe` sent, waiting for `subscribed`.
    SubscriptionRequested,
    /// Subscription acknowledged; `request_data` not yet sent.
    Subscribed,
    /// `request_data` sent; frames are flowing.
    Streaming,
}

impl LinkState {
    /// Returns the display label for this state.
    pub fn label(&self) -> &'static str {
        match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::SubscriptionRequested => "subscribing",
            LinkState::Subscribed => "subscribed",
            LinkState::Streaming => "streaming",
        }
    }

    /// True once frames are expected.
    pub fn is_streaming(&self) -> bool {
        matches!(self, LinkState::Streaming)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the driver should do in response to one event.
#[derive(Debug)]
pub enum Step {
    /// Send a command to the server.
    Emit(ClientCommand),
    /// Hand a decoded frame to the sink.
    Forward(TelemetryData),
    /// A frame failed to decode; report it and carry on.
    Reject(ClientError),
    /// Nothing to do.
    Idle,
}

/// Handshake state for one connection.
#[derive(Debug, Clone)]
pub struct Handshake {
    topics: Topics,
    refresh_rate: RefreshRate,
    state: LinkState,
}

impl Handshake {
    /// A handshake waiting for its transport to connect.
    pub fn new(topics: Topics, refresh_rate: RefreshRate) -> Self {
        Self {
            topics,
            refresh_rate,
            state: LinkState::Connecting,
        }
    }

    /// Current state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Advance on one transport event.
    pub fn handle(&mut self, event: TransportEvent) -> Step {
        match event {
            TransportEvent::Connect => {
                // Fires again after every reconnect; the handshake replays from here.
                self.state = LinkState::Connected;
                Step::Emit(ClientCommand::Subscribe(self.topics.clone()))
            }
            TransportEvent::Disconnect { .. } => {
                self.state = LinkState::Connecting;
                Step::Idle
            }
            TransportEvent::Message { event, payload } => self.on_message(&event, &payload),
        }
    }

    /// Record that `command` reached the transport.
    pub fn sent(&mut self, command: &ClientCommand) {
        self.state = match command {
            ClientCommand::Subscribe(_) => LinkState::SubscriptionRequested,
            ClientCommand::RequestData(_) => LinkState::Streaming,
        };
    }

    fn on_message(&mut self, name: &str, payload: &Value) -> Step {
        match name {
            event::SUBSCRIBED => {
                if self.state != LinkState::SubscriptionRequested {
                    debug!(state = %self.state, "subscription acknowledged outside of handshake");
                }
                self.state = LinkState::Subscribed;
                Step::Emit(ClientCommand::RequestData(self.refresh_rate))
            }
            event::TELEMETRY_DATA => match decode_frame(payload) {
                Ok(data) => Step::Forward(data),
                Err(e) => Step::Reject(e),
            },
            other => {
                debug!(event = other, "ignoring unknown server event");
                Step::Idle
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handshake() -> Handshake {
        Handshake::new(Topics::from("drive"), RefreshRate::new(20).unwrap())
    }

    /// Handle an event and, like the driver, report any emitted command as sent.
    fn step(hs: &mut Handshake, event: TransportEvent) -> Step {
        let step = hs.handle(event);
        if let Step::Emit(command) = &step {
            hs.sent(command);
        }
        step
    }

    fn message(event: &str, payload: Value) -> TransportEvent {
        TransportEvent::Message {
            event: event.to_string(),
            payload,
        }
    }

    #[test]
    fn test_full_handshake() {
        let mut hs = handshake();
        assert_eq!(hs.state(), LinkState::Connecting);

        let command = match hs.handle(TransportEvent::Connect) {
            Step::Emit(command @ ClientCommand::Subscribe(_)) => command,
            other => panic!("unexpected step {:?}", other),
        };
        assert_eq!(command, ClientCommand::Subscribe(Topics::from("drive")));
        assert_eq!(hs.state(), LinkState::Connected);
        hs.sent(&command);
        assert_eq!(hs.state(), LinkState::SubscriptionRequested);

        let command = match hs.handle(message("subscribed", Value::Null)) {
            Step::Emit(command @ ClientCommand::RequestData(_)) => command,
            other => panic!("unexpected step {:?}", other),
        };
        assert_eq!(command, ClientCommand::RequestData(RefreshRate::new(20).unwrap()));
        assert_eq!(hs.state(), LinkState::Subscribed);
        hs.sent(&command);
        assert!(hs.state().is_streaming());

        match hs.handle(message("telemetry_data", json!(r#"{"speed": 1}"#))) {
            Step::Forward(data) => assert_eq!(data, TelemetryData::new().with("speed", 1)),
            other => panic!("unexpected step {:?}", other),
        }
        assert!(hs.state().is_streaming());
    }

    #[test]
    fn test_malformed_frame_is_rejected_without_state_change() {
        let mut hs = handshake();
        step(&mut hs, TransportEvent::Connect);
        step(&mut hs, message("subscribed", Value::Null));

        assert!(matches!(
            step(&mut hs, message("telemetry_data", json!("{\"speed\":"))),
            Step::Reject(ClientError::ProtocolViolation { .. })
        ));
        assert_eq!(hs.state(), LinkState::Streaming);
    }

    #[test]
    fn test_disconnect_and_reconnect_replays() {
        let mut hs = handshake();
        step(&mut hs, TransportEvent::Connect);
        step(&mut hs, message("subscribed", Value::Null));

        assert!(matches!(
            step(
                &mut hs,
                TransportEvent::Disconnect {
                    reason: "eof".into()
                }
            ),
            Step::Idle
        ));
        assert_eq!(hs.state(), LinkState::Connecting);

        assert!(matches!(
            step(&mut hs, TransportEvent::Connect),
            Step::Emit(ClientCommand::Subscribe(_))
        ));
        assert_eq!(hs.state(), LinkState::SubscriptionRequested);
        assert!(matches!(
            step(&mut hs, message("subscribed", Value::Null)),
            Step::Emit(ClientCommand::RequestData(rate)) if rate.get() == 20
        ));
    }

    #[test]
    fn test_unknown_events_are_ignored() {
        let mut hs = handshake();
        assert!(matches!(hs.handle(message("heartbeat", json!(1))), Step::Idle));
        assert_eq!(hs.state(), LinkState::Connecting);
    }
}
