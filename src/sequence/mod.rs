//! Notification sequences.
//!
//! A [`Sequence`] is an ordered list of notifications narrating one event
//! (battery low, match started, ...). The [`Sequencer`] presents the steps
//! strictly one after another, waiting for each to finish, then records the
//! sequence as complete in [`SequenceFlags`].
//!
//! Sequences are usually armed against telemetry with [`Sequencer::arm`]:
//! wait until a [`Trigger`] holds, play the sequence once, detach.

mod flags;
mod notifier;
mod trigger;

pub use flags::SequenceFlags;
pub use notifier::{ChannelNotifier, LogNotifier, Notification, Notifier, DEFAULT_DISPLAY};
pub use trigger::{Condition, Trigger};

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::{wait_until, SettingsStore, TelemetryStore};

/// An ordered list of notification steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    /// Unique id, used as the completion flag key.
    pub id: String,
    /// Steps, presented in order.
    pub steps: Vec<Notification>,
}

impl Sequence {
    /// Create an empty sequence.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn step(mut self, notification: Notification) -> Self {
        self.steps.push(notification);
        self
    }
}

/// Plays sequences through a [`Notifier`].
#[derive(Debug, Clone)]
pub struct Sequencer {
    notifier: Arc<dyn Notifier>,
    flags: SequenceFlags,
    settings: SettingsStore,
}

impl Sequencer {
    /// Create a sequencer.
    pub fn new(notifier: Arc<dyn Notifier>, flags: SequenceFlags, settings: SettingsStore) -> Self {
        Self {
            notifier,
            flags,
            settings,
        }
    }

    /// The completion flags this sequencer writes.
    pub fn flags(&self) -> &SequenceFlags {
        &self.flags
    }

    /// Present every step in order, then mark the sequence complete.
    ///
    /// Settings are read per step: with notifications off the step is
    /// skipped, with sounds off (or volume 0) its sound cue is stripped. The
    /// sequence is marked complete either way.
    pub async fn run(&self, sequence: &Sequence) {
        info!(sequence = %sequence.id, steps = sequence.steps.len(), "running sequence");

        for (index, step) in sequence.steps.iter().enumerate() {
            let settings = self.settings.get();
            if !settings.notifications {
                debug!(sequence = %sequence.id, index, "notifications off; skipping step");
                continue;
            }

            if step.sound.is_some() && (!settings.sounds || settings.volume == 0) {
                let mut silent = step.clone();
                silent.sound = None;
                self.notifier.present(&silent).await;
            } else {
                self.notifier.present(step).await;
            }
        }

        self.flags.complete(&sequence.id);
        info!(sequence = %sequence.id, "sequence complete");
    }

    /// Play `sequence` once, the first time `trigger` holds on `telemetry`.
    ///
    /// Returns immediately; the wait runs on its own task. Does nothing if the
    /// sequence has already completed, before or during the wait.
    pub fn arm(&self, trigger: Trigger, sequence: Sequence, telemetry: &TelemetryStore) -> JoinHandle<()> {
        let sequencer = self.clone();
        let mut rx = telemetry.subscribe();

        tokio::spawn(async move {
            if sequencer.flags.is_complete(&sequence.id) {
                debug!(sequence = %sequence.id, "already complete; not arming");
                return;
            }

            debug!(sequence = %sequence.id, %trigger, "sequence armed");
            if wait_until(&mut rx, |snapshot| trigger.matches(&snapshot.fields)).await.is_none() {
                return;
            }
            drop(rx);

            if sequencer.flags.is_complete(&sequence.id) {
                return;
            }
            info!(sequence = %sequence.id, %trigger, "trigger fired");
            sequencer.run(&sequence).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SettingUpdate, TelemetrySink};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;
    use telewatch_types::TelemetryData;

    /// Notifier that records what it was asked to show.
    #[derive(Debug, Default)]
    struct Recording {
        shown: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn present(&self, notification: &Notification) {
            // Yield so later steps would overtake this one if ordering were broken.
            tokio::task::yield_now().await;
            self.shown.lock().push(notification.clone());
        }
    }

    fn battery_sequence() -> Sequence {
        Sequence::new("low-battery")
            .step(Notification::new("Battery", "Below 20%").with_sound("beep"))
            .step(Notification::new("Battery", "Return to base"))
    }

    fn sequencer() -> (Sequencer, Arc<Recording>, SettingsStore) {
        let recording = Arc::new(Recording::default());
        let settings = SettingsStore::default();
        let sequencer = Sequencer::new(recording.clone(), SequenceFlags::new(), settings.clone());
        (sequencer, recording, settings)
    }

    #[tokio::test]
    async fn test_run_presents_steps_in_order() {
        let (sequencer, recording, _) = sequencer();
        sequencer.run(&battery_sequence()).await;

        let shown = recording.shown.lock().clone();
        assert_eq!(shown, battery_sequence().steps);
        assert!(sequencer.flags().is_complete("low-battery"));
    }

    #[tokio::test]
    async fn test_run_respects_settings() {
        let (sequencer, recording, settings) = sequencer();
        settings.apply(SettingUpdate::Sounds(false));
        sequencer.run(&battery_sequence()).await;
        assert!(recording.shown.lock().iter().all(|n| n.sound.is_none()));

        recording.shown.lock().clear();
        settings.apply(SettingUpdate::Notifications(false));
        sequencer.run(&Sequence::new("quiet").step(Notification::new("a", "b"))).await;
        assert!(recording.shown.lock().is_empty());
        assert!(sequencer.flags().is_complete("quiet"));
    }

    #[tokio::test]
    async fn test_arm_fires_once_when_trigger_holds() {
        let (sequencer, recording, _) = sequencer();
        let telemetry = TelemetryStore::new();
        let trigger = Trigger::new("battery", Condition::Below(20.0));

        let handle = sequencer.arm(trigger.clone(), battery_sequence(), &telemetry);
        telemetry.update(TelemetryData::new().with("battery", 64.0));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(recording.shown.lock().is_empty());

        telemetry.update(TelemetryData::new().with("battery", 19.0));
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
        assert_eq!(recording.shown.lock().len(), 2);

        // Already complete: arming again plays nothing.
        let again = sequencer.arm(trigger, battery_sequence(), &telemetry);
        tokio::time::timeout(Duration::from_secs(1), again).await.unwrap().unwrap();
        assert_eq!(recording.shown.lock().len(), 2);
    }
}
