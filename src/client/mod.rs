//! Real-time telemetry subscription client.
//!
//! Bridges a push-based transport to the [`TelemetrySink`]. After
//! [`TelemetryClient::start`] the client opens one connection and, on every
//! transport `connect`, replays the handshake:
//!
//! ```text
//! transport ── connect ─────────▶ client ── subscribe(topics) ──────────▶ server
//! server ──── subscribed ───────▶ client ── request_data(refresh_rate) ─▶ server
//! server ──── telemetry_data ───▶ client ── update(record) ─────────────▶ sink
//! ```
//!
//! Frames reach the sink in the order the transport delivers them. A frame
//! that fails to decode is logged and dropped; the stream carries on.

mod codec;
mod handshake;

pub use codec::{decode_frame, ClientCommand};
pub use handshake::{Handshake, LinkState, Step};

use std::sync::Arc;

use telewatch_types::{RefreshRate, Topics};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::store::TelemetrySink;
use crate::transport::{Connector, Outbound, Session, TransportEvent};

/// Subscribes to a telemetry server and feeds decoded frames to a sink.
///
/// One client owns at most one connection; `start` a second time fails with
/// [`ClientError::AlreadyStarted`]. There is no `stop`: the connection lives
/// until the transport shuts down.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use telewatch::store::TelemetryStore;
/// use telewatch::transport::TcpConnector;
/// use telewatch::TelemetryClient;
///
/// # tokio_test::block_on(async {
/// let store = TelemetryStore::new();
/// let mut client = TelemetryClient::new(TcpConnector::new("10.12.80.2:5810"), Arc::new(store.clone()));
/// client.start("drivetrain", 20)?;
///
/// let snapshot = store.wait_for(|s| s.frames > 0).await;
/// println!("{:?}", snapshot.latest);
/// # Ok::<(), telewatch::ClientError>(())
/// # });
/// ```
pub struct TelemetryClient<C: Connector> {
    connector: C,
    sink: Arc<dyn TelemetrySink>,
    link: Arc<watch::Sender<LinkState>>,
    driver: Option<JoinHandle<()>>,
}

impl<C: Connector> TelemetryClient<C> {
    /// Create a client that will connect through `connector` and write to `sink`.
    pub fn new(connector: C, sink: Arc<dyn TelemetrySink>) -> Self {
        let (link, _) = watch::channel(LinkState::Disconnected);
        Self {
            connector,
            sink,
            link: Arc::new(link),
            driver: None,
        }
    }

    /// Open the connection and start the handshake.
    ///
    /// `refresh_rate` is validated before anything else happens: a value that
    /// is not a whole number, or is below 1, fails with
    /// [`ClientError::InvalidArgument`] and no connection is opened.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<R>(&mut self, topics: impl Into<Topics>, refresh_rate: R) -> Result<(), ClientError>
    where
        R: TryInto<RefreshRate>,
        ClientError: From<R::Error>,
    {
        let refresh_rate = refresh_rate.try_into()?;
        if self.driver.is_some() {
            return Err(ClientError::AlreadyStarted);
        }
        let topics = topics.into();

        info!(
            endpoint = %self.connector.description(),
            %topics,
            %refresh_rate,
            "starting telemetry subscription"
        );

        let session = self.connector.open();
        self.link.send_replace(LinkState::Connecting);
        let handshake = Handshake::new(topics, refresh_rate);
        self.driver = Some(tokio::spawn(drive(
            session,
            handshake,
            self.sink.clone(),
            self.link.clone(),
        )));
        Ok(())
    }

    /// Whether `start` has succeeded on this client.
    pub fn is_started(&self) -> bool {
        self.driver.is_some()
    }

    /// Current handshake state.
    pub fn link_state(&self) -> LinkState {
        *self.link.borrow()
    }

    /// Subscribe to handshake state changes.
    pub fn watch_link(&self) -> watch::Receiver<LinkState> {
        self.link.subscribe()
    }

    /// Returns a description of the endpoint.
    pub fn endpoint(&self) -> String {
        self.connector.description()
    }
}

impl<C: Connector> std::fmt::Debug for TelemetryClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryClient")
            .field("connector", &self.connector)
            .field("link", &*self.link.borrow())
            .field("started", &self.driver.is_some())
            .finish()
    }
}

/// Run the handshake over one session until the transport shuts down.
async fn drive(
    mut session: Session,
    mut handshake: Handshake,
    sink: Arc<dyn TelemetrySink>,
    link: Arc<watch::Sender<LinkState>>,
) {
    let mut frames: u64 = 0;
    let mut dropped: u64 = 0;
    let mut connection: u64 = 0;

    while let Some(event) = session.events.recv().await {
        if event == TransportEvent::Connect {
            connection += 1;
        }
        match handshake.handle(event) {
            Step::Emit(command) => {
                link.send_replace(handshake.state());
                debug!(event = command.event(), "emitting command");
                let outbound = Outbound::new(connection, command.to_envelope());
                if session.commands.send(outbound).is_err() {
                    let e = ClientError::Transport(format!("closed before `{}` was sent", command.event()));
                    warn!(error = %e, "stopping telemetry driver");
                    break;
                }
                handshake.sent(&command);
                if handshake.state().is_streaming() {
                    info!("telemetry subscription established");
                }
            }
            Step::Forward(data) => {
                frames += 1;
                sink.update(data);
            }
            Step::Reject(e) => {
                dropped += 1;
                warn!(error = %e, dropped, "dropping malformed telemetry frame");
            }
            Step::Idle => {}
        }
        link.send_if_modified(|state| {
            let next = handshake.state();
            if *state == next {
                return false;
            }
            debug!(from = %state, to = %next, "link state changed");
            *state = next;
            true
        });
    }

    link.send_replace(LinkState::Disconnected);
    info!(frames, dropped, "telemetry transport shut down");
}
