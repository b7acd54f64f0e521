//! # telewatch-types
//!
//! Core types for the telewatch telemetry link. This crate defines the records
//! a telemetry server pushes, the topic and refresh-rate arguments a client
//! subscribes with, and the JSON envelope both sides exchange on the wire.
//!
//! ## Wire Protocol
//!
//! Every message on the connection is one [`Envelope`]: an event name plus an
//! optional JSON payload.
//!
//! | Direction       | Event            | Payload                          |
//! |-----------------|------------------|----------------------------------|
//! | client → server | `subscribe`      | [`Topics`]                       |
//! | server → client | `subscribed`     | none                             |
//! | client → server | `request_data`   | [`DataRequest`]                  |
//! | server → client | `telemetry_data` | text-encoded [`TelemetryData`]   |
//!
//! ## Example
//!
//! ```rust
//! use telewatch_types::{RefreshRate, TelemetryData, Topics};
//!
//! let topics = Topics::from(vec!["drivetrain".to_string(), "arm".to_string()]);
//! let rate = RefreshRate::new(20).unwrap();
//!
//! let frame = TelemetryData::new()
//!     .with("speed", 42)
//!     .with("heading", 180)
//!     .with("brake", false);
//!
//! assert_eq!(topics.names(), vec!["drivetrain", "arm"]);
//! assert_eq!(rate.get(), 20);
//! assert_eq!(frame.len(), 3);
//! ```

mod error;
mod rate;
mod record;
mod topics;
mod wire;

pub use error::RateError;
pub use rate::RefreshRate;
pub use record::{TelemetryData, TelemetryValue};
pub use topics::Topics;
pub use wire::{event, DataRequest, Envelope};
