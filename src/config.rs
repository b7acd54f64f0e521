//! Application configuration.
//!
//! Layered, lowest priority first: built-in defaults, an optional TOML file,
//! then `TELEWATCH__*` environment variables.
//!
//! ```toml
//! [server]
//! address = "10.12.80.2:5810"
//! reconnect_delay = "2s"
//!
//! [subscription]
//! topics = ["drivetrain", "power"]
//!
//! [settings]
//! refresh_rate = 20
//! sounds = false
//!
//! [[sequences]]
//! id = "low-battery"
//! trigger = { field = "battery", below = 20.0 }
//! steps = [
//!     { title = "Battery low", message = "Below 20%", sound = "beep" },
//!     { title = "Battery low", message = "Return to the pit", duration = "5s" },
//! ]
//!
//! [log]
//! level = "info"
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use telewatch_types::{TelemetryValue, Topics};

use crate::data::duration::parse_duration;
use crate::sequence::{Condition, Notification, Sequence, Trigger, DEFAULT_DISPLAY};
use crate::store::Settings;

/// Default telemetry server address.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:5810";
/// Default topic when none is configured.
pub const DEFAULT_TOPIC: &str = "telemetry";
/// Prefix for environment overrides, e.g. `TELEWATCH__SERVER__ADDRESS`.
pub const ENV_PREFIX: &str = "TELEWATCH";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Where to connect.
    pub server: ServerConfig,
    /// What to subscribe to.
    pub subscription: SubscriptionConfig,
    /// Initial values of the settings store.
    #[serde(default)]
    pub settings: Settings,
    /// Notification sequences and their triggers.
    #[serde(default)]
    pub sequences: Vec<SequenceConfig>,
    /// Logging.
    pub log: LogConfig,
}

/// `[server]`
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// `host:port` of the telemetry server.
    pub address: String,
    /// Pause between reconnect attempts, e.g. `"500ms"`.
    pub reconnect_delay: String,
}

/// `[subscription]`
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    /// Topic names, sent verbatim in `subscribe`.
    pub topics: Vec<String>,
}

/// `[log]`
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

/// One `[[sequences]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceConfig {
    /// Unique id; a completed id never plays again.
    pub id: String,
    /// When to play.
    pub trigger: TriggerConfig,
    /// Notifications, in the order they are shown.
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// A sequence trigger: a field and exactly one of `above`, `below`, `equals`.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    /// Telemetry field to watch.
    pub field: String,
    /// Fire when the field is strictly greater.
    pub above: Option<f64>,
    /// Fire when the field is strictly less.
    pub below: Option<f64>,
    /// Fire when the field equals this value.
    pub equals: Option<TelemetryValue>,
}

/// One notification step.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    pub title: String,
    pub message: String,
    /// Sound cue name.
    pub sound: Option<String>,
    /// Display time, e.g. `"5s"`. Defaults to three seconds.
    pub duration: Option<String>,
}

impl AppConfig {
    /// Load configuration from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("server.address", DEFAULT_ADDRESS)?
            .set_default("server.reconnect_delay", "2s")?
            .set_default("subscription.topics", vec![DEFAULT_TOPIC])?
            .set_default("log.level", "info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("subscription.topics"),
            )
            .build()
            .context("failed to load configuration")?;

        config.try_deserialize().context("invalid configuration")
    }

    /// Parsed reconnect delay.
    pub fn reconnect_delay(&self) -> Result<Duration> {
        parse_duration(&self.server.reconnect_delay)
            .with_context(|| format!("invalid server.reconnect_delay {:?}", self.server.reconnect_delay))
    }

    /// Topics to subscribe to. A single topic is sent as a plain string.
    pub fn topics(&self) -> Topics {
        match self.subscription.topics.as_slice() {
            [single] => Topics::One(single.clone()),
            _ => Topics::Many(self.subscription.topics.clone()),
        }
    }

    /// Build every configured sequence with its trigger.
    pub fn sequences(&self) -> Result<Vec<(Trigger, Sequence)>> {
        self.sequences
            .iter()
            .map(|entry| {
                entry
                    .build()
                    .with_context(|| format!("invalid sequence {:?}", entry.id))
            })
            .collect()
    }
}

impl SequenceConfig {
    fn build(&self) -> Result<(Trigger, Sequence)> {
        if self.steps.is_empty() {
            bail!("a sequence needs at least one step");
        }
        let trigger = self.trigger.build()?;
        let mut sequence = Sequence::new(&self.id);
        for step in &self.steps {
            sequence = sequence.step(step.build()?);
        }
        Ok((trigger, sequence))
    }
}

impl TriggerConfig {
    fn build(&self) -> Result<Trigger> {
        let condition = match (self.above, self.below, &self.equals) {
            (Some(v), None, None) => Condition::Above(v),
            (None, Some(v), None) => Condition::Below(v),
            (None, None, Some(v)) => Condition::Equals(v.clone()),
            _ => bail!("trigger on {:?} needs exactly one of above, below or equals", self.field),
        };
        Ok(Trigger::new(&self.field, condition))
    }
}

impl StepConfig {
    fn build(&self) -> Result<Notification> {
        let duration = match &self.duration {
            Some(text) => parse_duration(text)?,
            None => DEFAULT_DISPLAY,
        };
        let mut notification = Notification::new(&self.title, &self.message).with_duration(duration);
        notification.sound = self.sound.clone();
        Ok(notification)
    }
}
