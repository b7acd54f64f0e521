//! Error types for the telemetry client.

use std::convert::Infallible;

use telewatch_types::RateError;
use thiserror::Error;

/// Errors raised by [`TelemetryClient`](crate::TelemetryClient) and its frame decoder.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A caller-supplied argument was rejected before any connection was opened.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] RateError),

    /// `start` was called on a client that already owns a connection.
    #[error("telemetry client already started")]
    AlreadyStarted,

    /// The server sent a frame that could not be decoded.
    #[error("protocol violation on `{event}`: {reason}")]
    ProtocolViolation {
        /// The event the frame arrived on.
        event: String,
        /// Why decoding failed.
        reason: String,
    },

    /// The transport went away underneath the client.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Shorthand for a [`ClientError::ProtocolViolation`].
    pub fn protocol(event: &str, reason: impl Into<String>) -> Self {
        ClientError::ProtocolViolation {
            event: event.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<Infallible> for ClientError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
