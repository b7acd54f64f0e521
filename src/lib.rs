//! # telewatch
//!
//! A live dashboard and client library for robot telemetry servers.
//!
//! The [`TelemetryClient`] connects through a [`Connector`](transport::Connector),
//! subscribes to topics, asks for a refresh rate and feeds every decoded
//! telemetry frame into a [`TelemetrySink`](store::TelemetrySink), in the
//! order the transport delivered them. The handshake is replayed on every
//! reconnect.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐ events  ┌──────────────┐ frames ┌────────────────┐
//! │ transport │───────▶│    client    │───────▶│ TelemetryStore │
//! │ (tcp/mem) │◀───────│ (handshake)  │        └───────┬────────┘
//! └───────────┘commands└──────────────┘                │ watch
//!                                            ┌─────────┴─────────┐
//!                                            ▼                   ▼
//!                                     ┌────────────┐      ┌────────────┐
//!                                     │ sequencer  │      │  app / ui  │
//!                                     │ (triggers) │      │  (ratatui) │
//!                                     └────────────┘      └────────────┘
//! ```
//!
//! - **[`transport`]**: connector trait, TCP and in-memory implementations
//! - **[`client`]**: handshake state machine and frame decoding
//! - **[`store`]**: reactive telemetry and settings stores
//! - **[`sequence`]**: ordered notification sequences armed on telemetry triggers
//! - **[`config`]**: layered configuration (defaults, TOML, environment)
//! - **[`dashboard`]**: wires the pieces above together
//! - **[`app`]**, **[`events`]**, **[`ui`]**, **[`data`]**: the terminal dashboard
//!
//! ## Usage
//!
//! ```bash
//! # Live TUI against a robot on the field network
//! telewatch --connect 10.12.80.2:5810 --topic drivetrain --topic power --rate 20
//!
//! # JSON lines on stdout
//! telewatch --config telewatch.toml --headless
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use telewatch::store::TelemetryStore;
//! use telewatch::transport::memory;
//! use telewatch::TelemetryClient;
//!
//! # tokio_test::block_on(async {
//! let (connector, mut server) = memory::pair();
//! let store = TelemetryStore::new();
//! let mut client = TelemetryClient::new(connector, Arc::new(store.clone()));
//! client.start("drivetrain", 20).unwrap();
//!
//! server.connect().await;
//! server.next_command().await; // subscribe
//! server.subscribed().await;
//! server.next_command().await; // request_data
//! server.telemetry(r#"{"speed": 1.5}"#).await;
//!
//! let snapshot = store.wait_for(|s| s.frames == 1).await;
//! assert_eq!(snapshot.latest.get("speed").and_then(|v| v.as_f64()), Some(1.5));
//! # });
//! ```

pub mod app;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod events;
pub mod sequence;
pub mod store;
pub mod transport;
pub mod ui;

pub use app::App;
pub use client::{LinkState, TelemetryClient};
pub use dashboard::Dashboard;
pub use error::ClientError;
