use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use telewatch::config::AppConfig;
use telewatch::sequence::{ChannelNotifier, LogNotifier, Notification};
use telewatch::transport::{Connector, TcpConnector};
use telewatch::{events, ui, App, Dashboard};
use telewatch_types::RefreshRate;

/// How often the TUI redraws while idle.
const TICK: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "telewatch", version)]
#[command(about = "Live dashboard for a robot telemetry server")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Telemetry server address (host:port), overrides server.address
    #[arg(long)]
    connect: Option<String>,

    /// Topic to subscribe to; repeat for several, overrides subscription.topics
    #[arg(short, long = "topic")]
    topics: Vec<String>,

    /// Refresh rate in Hz requested from the server, overrides settings.refresh_rate
    #[arg(short, long)]
    rate: Option<RefreshRate>,

    /// Print telemetry as JSON lines instead of running the TUI
    #[arg(long)]
    headless: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(address) = args.connect {
        config.server.address = address;
    }
    if !args.topics.is_empty() {
        config.subscription.topics = args.topics;
    }

    init_logging(&config.log.level, args.headless, args.log_file.as_deref())?;

    let connector =
        TcpConnector::new(&config.server.address).reconnect_delay(config.reconnect_delay()?);

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    if args.headless {
        let dashboard = Dashboard::launch(&config, connector, Arc::new(LogNotifier), args.rate)?;
        return rt.block_on(run_headless(dashboard));
    }

    let (notifier, notifications) = ChannelNotifier::create();
    let dashboard = Dashboard::launch(&config, connector, Arc::new(notifier), args.rate)?;
    let result = run_tui(&dashboard, notifications);
    if let Err(e) = &result {
        error!(error = %e, "dashboard exited with an error");
    }
    result
}

/// Logs go to `--log-file` when given, to stderr in headless mode, and
/// nowhere otherwise so they cannot corrupt the TUI.
fn init_logging(level: &str, headless: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

/// Print every frame as one JSON line until Ctrl-C.
async fn run_headless<C: Connector>(dashboard: Dashboard<C>) -> Result<()> {
    let mut frames = dashboard.telemetry().frames();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(frame) => println!("{}", serde_json::to_string(&frame.data)?),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "stdout is too slow, frames were skipped");
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }
    }
    Ok(())
}

/// Run the TUI on the current thread until the user quits.
fn run_tui<C: Connector>(
    dashboard: &Dashboard<C>,
    notifications: tokio::sync::mpsc::UnboundedReceiver<Notification>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal before printing a panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let mut app = App::new(dashboard, notifications);
    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.refresh();
        terminal.draw(|frame| ui::render(frame, app))?;

        if let Some(event) = events::poll_event(TICK)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }
    }
    Ok(())
}
