//! Notification presentation.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

/// How long a notification stays up when no duration is given.
pub const DEFAULT_DISPLAY: Duration = Duration::from_secs(3);

/// One stacked audio + visual notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Sound cue to play alongside, if any.
    pub sound: Option<String>,
    /// How long the notification stays up.
    pub duration: Duration,
}

impl Notification {
    /// A silent notification shown for [`DEFAULT_DISPLAY`].
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            sound: None,
            duration: DEFAULT_DISPLAY,
        }
    }

    /// Attach a sound cue.
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// Set the display duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Presents notifications.
///
/// `present` resolves once the notification has finished displaying, which
/// is the completion signal the sequencer waits on before the next step.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    /// Show one notification and wait for it to finish.
    async fn present(&self, notification: &Notification);
}

/// Writes notifications to the log. Used when there is no screen.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn present(&self, notification: &Notification) {
        info!(
            title = %notification.title,
            sound = notification.sound.as_deref().unwrap_or("-"),
            "{}",
            notification.message
        );
        tokio::time::sleep(notification.duration).await;
    }
}

/// Forwards notifications to a receiver (the TUI) and waits out their duration.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver that displays its notifications.
    pub fn create() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn present(&self, notification: &Notification) {
        // A closed receiver means nobody is watching; still honour the timing.
        let _ = self.sender.send(notification.clone());
        tokio::time::sleep(notification.duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_channel_notifier_waits_for_duration() {
        let (notifier, mut rx) = ChannelNotifier::create();
        let note = Notification::new("Heads up", "Arm raised").with_duration(Duration::from_secs(5));

        let start = tokio::time::Instant::now();
        notifier.present(&note).await;

        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(rx.try_recv().unwrap(), note);
    }

    #[test]
    fn test_builder() {
        let note = Notification::new("t", "m").with_sound("chime");
        assert_eq!(note.sound.as_deref(), Some("chime"));
        assert_eq!(note.duration, DEFAULT_DISPLAY);
    }
}
