//! Frame decoding and command encoding.

use serde::Deserialize;
use serde_json::Value;
use telewatch_types::{event, DataRequest, Envelope, RefreshRate, TelemetryData, Topics};

use crate::error::ClientError;

/// A command the client sends to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// Ask for the given topics.
    Subscribe(Topics),
    /// Ask for pushes at the given cadence.
    RequestData(RefreshRate),
}

impl ClientCommand {
    /// The wire event name.
    pub fn event(&self) -> &'static str {
        match self {
            ClientCommand::Subscribe(_) => event::SUBSCRIBE,
            ClientCommand::RequestData(_) => event::REQUEST_DATA,
        }
    }

    /// Encode as a wire envelope.
    pub fn to_envelope(&self) -> Envelope {
        let data = match self {
            ClientCommand::Subscribe(topics) => topics.to_payload(),
            ClientCommand::RequestData(refresh_rate) => DataRequest {
                refresh_rate: *refresh_rate,
            }
            .to_payload(),
        };
        Envelope::new(self.event(), data)
    }
}

/// Decode the payload of a `telemetry_data` event.
///
/// The server sends the record as JSON text inside the payload. A payload that
/// is already a JSON object is accepted as well; anything else is a
/// [`ClientError::ProtocolViolation`].
pub fn decode_frame(payload: &Value) -> Result<TelemetryData, ClientError> {
    match payload {
        Value::String(text) => serde_json::from_str(text)
            .map_err(|e| ClientError::protocol(event::TELEMETRY_DATA, e.to_string())),
        Value::Object(_) => TelemetryData::deserialize(payload)
            .map_err(|e| ClientError::protocol(event::TELEMETRY_DATA, e.to_string())),
        other => Err(ClientError::protocol(
            event::TELEMETRY_DATA,
            format!("expected a text-encoded record, got {}", kind(other)),
        )),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
