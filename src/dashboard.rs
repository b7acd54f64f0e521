//! Wiring of the client, the stores and the armed sequences.

use std::sync::Arc;

use anyhow::{Context, Result};
use telewatch_types::RefreshRate;
use tokio::task::JoinHandle;
use tracing::info;

use crate::client::TelemetryClient;
use crate::config::AppConfig;
use crate::sequence::{Notifier, SequenceFlags, Sequencer};
use crate::store::{SettingUpdate, SettingsStore, TelemetryStore};
use crate::transport::Connector;

/// A running dashboard: one subscribed client plus everything reading from it.
#[derive(Debug)]
pub struct Dashboard<C: Connector> {
    client: TelemetryClient<C>,
    telemetry: TelemetryStore,
    settings: SettingsStore,
    sequencer: Sequencer,
    armed: Vec<JoinHandle<()>>,
}

impl<C: Connector> Dashboard<C> {
    /// Start the subscription and arm every configured sequence.
    ///
    /// `rate` overrides `settings.refresh_rate` from the configuration.
    /// Must be called from within a tokio runtime.
    pub fn launch(
        config: &AppConfig,
        connector: C,
        notifier: Arc<dyn Notifier>,
        rate: Option<RefreshRate>,
    ) -> Result<Self> {
        let sequences = config.sequences()?;

        let settings = SettingsStore::new(config.settings.clone());
        if let Some(rate) = rate {
            settings.apply(SettingUpdate::RefreshRate(rate));
        }

        let telemetry = TelemetryStore::new();
        let mut client = TelemetryClient::new(connector, Arc::new(telemetry.clone()));
        client
            .start(config.topics(), settings.get().refresh_rate)
            .context("failed to start telemetry client")?;

        let sequencer = Sequencer::new(notifier, SequenceFlags::new(), settings.clone());
        let armed = sequences
            .into_iter()
            .map(|(trigger, sequence)| sequencer.arm(trigger, sequence, &telemetry))
            .collect::<Vec<_>>();

        info!(endpoint = %client.endpoint(), sequences = armed.len(), "dashboard running");

        Ok(Self {
            client,
            telemetry,
            settings,
            sequencer,
            armed,
        })
    }

    /// The subscribed client; watch its link state from here.
    pub fn client(&self) -> &TelemetryClient<C> {
        &self.client
    }

    /// The store every decoded frame lands in.
    pub fn telemetry(&self) -> &TelemetryStore {
        &self.telemetry
    }

    /// Live settings, shared with the sequencer.
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Completion flags of the configured sequences.
    pub fn flags(&self) -> &SequenceFlags {
        self.sequencer.flags()
    }

    /// Sequences whose trigger has not fired yet.
    pub fn pending_sequences(&self) -> usize {
        self.armed.iter().filter(|handle| !handle.is_finished()).count()
    }
}

impl<C: Connector> Drop for Dashboard<C> {
    fn drop(&mut self) {
        for handle in &self.armed {
            handle.abort();
        }
    }
}
