//! TCP transport.
//!
//! Speaks newline-delimited JSON [`Envelope`]s over a plain TCP socket and
//! reconnects after a fixed delay whenever the socket drops.

use std::time::Duration;

use telewatch_types::Envelope;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{Connector, Outbound, Session, TransportEvent, EVENT_BUFFER};

/// Default pause between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// A connector that dials a TCP telemetry server.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use telewatch::transport::{Connector, TcpConnector};
///
/// # tokio_test::block_on(async {
/// let connector = TcpConnector::new("10.12.80.2:5810")
///     .reconnect_delay(Duration::from_millis(500));
/// let session = connector.open();
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
    reconnect_delay: Duration,
}

impl TcpConnector {
    /// Create a connector for `host:port`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    /// Set the pause between reconnect attempts.
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

impl Connector for TcpConnector {
    fn open(&self) -> Session {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_connection(
            self.address.clone(),
            self.reconnect_delay,
            event_tx,
            command_rx,
        ));

        Session {
            events: event_rx,
            commands: command_tx,
        }
    }

    fn description(&self) -> String {
        format!("tcp://{}", self.address)
    }
}

/// How a live socket session ended.
enum SessionEnd {
    /// The socket closed or failed; try again later.
    Lost(String),
    /// The client side is gone; stop for good.
    Shutdown,
}

/// Dial, serve and redial until the client drops its end of the session.
async fn run_connection(
    address: String,
    reconnect_delay: Duration,
    events: mpsc::Sender<TransportEvent>,
    mut commands: mpsc::UnboundedReceiver<Outbound>,
) {
    let mut connection: u64 = 0;

    loop {
        match TcpStream::connect(&address).await {
            Ok(stream) => {
                connection += 1;
                info!(%address, connection, "telemetry transport connected");
                if events.send(TransportEvent::Connect).await.is_err() {
                    return;
                }

                match serve(stream, connection, &events, &mut commands).await {
                    SessionEnd::Shutdown => return,
                    SessionEnd::Lost(reason) => {
                        warn!(%address, %reason, "telemetry transport disconnected");
                        let event = TransportEvent::Disconnect { reason };
                        if events.send(event).await.is_err() {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                debug!(%address, error = %e, "telemetry server unreachable");
            }
        }

        if events.is_closed() {
            return;
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

/// Pump one live socket: server lines become events, queued commands become lines.
///
/// Commands stamped for an earlier connection are discarded.
async fn serve(
    stream: TcpStream,
    connection: u64,
    events: &mpsc::Sender<TransportEvent>,
    commands: &mut mpsc::UnboundedReceiver<Outbound>,
) -> SessionEnd {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Envelope>(line) {
                        Ok(envelope) => {
                            if events.send(envelope.into()).await.is_err() {
                                return SessionEnd::Shutdown;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "discarding line that is not an event envelope");
                        }
                    }
                }
                Ok(None) => return SessionEnd::Lost("connection closed by server".to_string()),
                Err(e) => return SessionEnd::Lost(format!("read error: {}", e)),
            },
            command = commands.recv() => match command {
                Some(Outbound { connection: stamped, envelope }) => {
                    if stamped != connection {
                        debug!(event = %envelope.event, stamped, connection, "dropping command for an earlier connection");
                        continue;
                    }
                    let mut line = match serde_json::to_string(&envelope) {
                        Ok(line) => line,
                        Err(e) => {
                            warn!(event = %envelope.event, error = %e, "could not encode command");
                            continue;
                        }
                    };
                    line.push('\n');
                    if let Err(e) = writer.write_all(line.as_bytes()).await {
                        return SessionEnd::Lost(format!("write error: {}", e));
                    }
                }
                None => return SessionEnd::Shutdown,
            },
        }
    }
}
