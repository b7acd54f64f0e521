//! The message envelope exchanged on the telemetry connection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RefreshRate;

/// Event names used on the wire.
pub mod event {
    /// Client asks for the given topics.
    pub const SUBSCRIBE: &str = "subscribe";
    /// Server accepted the subscription.
    pub const SUBSCRIBED: &str = "subscribed";
    /// Client asks for pushes at a given cadence.
    pub const REQUEST_DATA: &str = "request_data";
    /// Server pushes one telemetry frame.
    pub const TELEMETRY_DATA: &str = "telemetry_data";
}

/// One named event with an optional payload.
///
/// Serialized as a single JSON object per line:
/// `{"event":"subscribe","data":["drive"]}`. A missing `data` field reads as
/// `null` and `null` payloads are omitted when writing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The event name.
    pub event: String,
    /// The event payload.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Envelope {
    /// Create an envelope with a payload.
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Create an envelope without a payload.
    pub fn bare(event: impl Into<String>) -> Self {
        Self::new(event, Value::Null)
    }
}

/// Payload of `request_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequest {
    /// Requested push frequency.
    pub refresh_rate: RefreshRate,
}

impl DataRequest {
    /// The JSON payload, `{"refresh_rate": <hz>}`.
    pub fn to_payload(&self) -> Value {
        serde_json::json!({ "refresh_rate": self.refresh_rate.get() })
    }
}
