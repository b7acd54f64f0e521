//! Reactive stores shared between the telemetry client and its readers.
//!
//! Each store wraps a [`tokio::sync::watch`] channel: one writer publishes,
//! any number of readers observe the latest value or await a change.
//! Readers that need every frame rather than the latest one take a
//! [`TelemetryStore::frames`] tap instead.
//!
//! - [`TelemetryStore`]: latest telemetry, written only by the client
//! - [`SettingsStore`]: dashboard settings, updated through [`SettingUpdate`]
//!
//! [`wait_until`] is the shared "wait for a condition, then detach" primitive.

pub mod settings;

pub use settings::{
    SettingError, SettingUpdate, Settings, SettingsStore, ThemeMode, MAX_VOLUME,
};

use std::sync::Arc;
use std::time::Instant;

use telewatch_types::TelemetryData;
use tokio::sync::{broadcast, watch};

/// Frames a [`TelemetryStore::frames`] receiver may fall behind before it lags.
pub const FRAME_BUFFER: usize = 256;

/// Sink for decoded telemetry frames.
///
/// Called once per frame, in transport order, from the client's driver task.
/// Implementations must not block.
pub trait TelemetrySink: Send + Sync {
    /// Accept one decoded frame.
    fn update(&self, data: TelemetryData);
}

/// What readers of the [`TelemetryStore`] see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    /// Every field seen so far, with its most recent value.
    pub fields: TelemetryData,
    /// The most recent frame exactly as received.
    pub latest: TelemetryData,
    /// Frames received since the store was created.
    pub frames: u64,
    /// When the most recent frame arrived.
    pub updated_at: Option<Instant>,
}

/// One frame as it passed through the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryFrame {
    pub data: TelemetryData,
    pub received_at: Instant,
}

/// Reactive store holding the latest telemetry.
///
/// Cloning yields another handle to the same store.
///
/// # Example
///
/// ```
/// use telewatch::store::{TelemetrySink, TelemetryStore};
/// use telewatch_types::TelemetryData;
///
/// let store = TelemetryStore::new();
/// store.update(TelemetryData::new().with("speed", 42));
///
/// assert_eq!(store.snapshot().frames, 1);
/// ```
#[derive(Debug, Clone)]
pub struct TelemetryStore {
    state: Arc<watch::Sender<TelemetrySnapshot>>,
    frames: broadcast::Sender<TelemetryFrame>,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(TelemetrySnapshot::default());
        let (frames, _) = broadcast::channel(FRAME_BUFFER);
        Self {
            state: Arc::new(tx),
            frames,
        }
    }

    /// Subscribe to changes.
    pub fn subscribe(&self) -> watch::Receiver<TelemetrySnapshot> {
        self.state.subscribe()
    }

    /// Receive every frame from now on, in order.
    ///
    /// A receiver more than [`FRAME_BUFFER`] frames behind gets
    /// [`RecvError::Lagged`](broadcast::error::RecvError::Lagged) and resumes
    /// at the oldest frame still buffered.
    pub fn frames(&self) -> broadcast::Receiver<TelemetryFrame> {
        self.frames.subscribe()
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.state.borrow().clone()
    }

    /// Wait until the contents satisfy `predicate`, then return them.
    pub async fn wait_for<F>(&self, predicate: F) -> TelemetrySnapshot
    where
        F: FnMut(&TelemetrySnapshot) -> bool,
    {
        let mut rx = self.subscribe();
        // The store owns the sender, so the channel cannot close under us.
        wait_until(&mut rx, predicate).await.unwrap_or_else(|| self.snapshot())
    }
}

impl TelemetrySink for TelemetryStore {
    fn update(&self, data: TelemetryData) {
        let received_at = Instant::now();
        self.state.send_modify(|snapshot| {
            snapshot.fields.merge(&data);
            snapshot.latest = data.clone();
            snapshot.frames += 1;
            snapshot.updated_at = Some(received_at);
        });
        // No receivers is not an error.
        let _ = self.frames.send(TelemetryFrame { data, received_at });
    }
}

/// Wait until the value behind `rx` satisfies `predicate`.
///
/// Checks the current value first, so a condition that already holds returns
/// immediately. Returns `None` if the sender is dropped before the condition
/// is met. The receiver is only borrowed; dropping it afterwards detaches.
pub async fn wait_until<T, F>(rx: &mut watch::Receiver<T>, predicate: F) -> Option<T>
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    rx.wait_for(predicate).await.ok().map(|value| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use telewatch_types::TelemetryValue;

    #[test]
    fn test_update_merges_fields() {
        let store = TelemetryStore::new();
        store.update(TelemetryData::new().with("speed", 10).with("heading", 90));
        store.update(TelemetryData::new().with("speed", 12));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.frames, 2);
        assert_eq!(snapshot.latest.len(), 1);
        assert_eq!(snapshot.fields.get("speed"), Some(&TelemetryValue::Integer(12)));
        assert_eq!(snapshot.fields.get("heading"), Some(&TelemetryValue::Integer(90)));
        assert!(snapshot.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_frames_sees_back_to_back_updates() {
        let store = TelemetryStore::new();
        let mut frames = store.frames();
        let mut latest = store.subscribe();

        store.update(TelemetryData::new().with("speed", 1));
        store.update(TelemetryData::new().with("speed", 3));

        // The watch side only keeps the newest value.
        assert_eq!(
            latest.borrow_and_update().latest.get("speed"),
            Some(&TelemetryValue::Integer(3))
        );

        let first = frames.recv().await.unwrap();
        let second = frames.recv().await.unwrap();
        assert_eq!(first.data.get("speed"), Some(&TelemetryValue::Integer(1)));
        assert_eq!(second.data.get("speed"), Some(&TelemetryValue::Integer(3)));
        assert!(first.received_at <= second.received_at);
        assert!(frames.try_recv().is_err());
    }

    #[test]
    fn test_update_without_frame_receivers() {
        let store = TelemetryStore::new();
        store.update(TelemetryData::new().with("speed", 1));
        assert_eq!(store.snapshot().frames, 1);
    }

    #[tokio::test]
    async fn test_wait_for_resolves_on_later_update() {
        let store = TelemetryStore::new();
        let writer = store.clone();

        let waiter = tokio::spawn(async move {
            store
                .wait_for(|s| {
                    s.fields.get("battery").and_then(|v| v.as_f64()).is_some_and(|v| v < 20.0)
                })
                .await
        });

        writer.update(TelemetryData::new().with("battery", 55.0));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        writer.update(TelemetryData::new().with("battery", 18.5));
        let snapshot = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.frames, 2);
    }

    #[tokio::test]
    async fn test_wait_until_checks_current_value_first() {
        let (tx, mut rx) = watch::channel(5u32);
        assert_eq!(wait_until(&mut rx, |v| *v == 5).await, Some(5));

        drop(tx);
        assert_eq!(wait_until(&mut rx, |v| *v == 6).await, None);
    }
}
