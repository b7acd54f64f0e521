//! Sequence completion flags.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::store::wait_until;

/// Reactive set of completed sequence ids.
///
/// A sequence that has completed is never replayed by a trigger.
#[derive(Debug, Clone)]
pub struct SequenceFlags {
    state: Arc<watch::Sender<BTreeSet<String>>>,
}

impl Default for SequenceFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceFlags {
    /// Create an empty flag set.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(BTreeSet::new());
        Self {
            state: Arc::new(tx),
        }
    }

    /// Mark `id` complete. Returns false if it already was.
    pub fn complete(&self, id: &str) -> bool {
        self.state.send_if_modified(|done| done.insert(id.to_string()))
    }

    /// Check whether `id` has completed.
    pub fn is_complete(&self, id: &str) -> bool {
        self.state.borrow().contains(id)
    }

    /// Wait until `id` is complete.
    pub async fn wait_complete(&self, id: &str) {
        let mut rx = self.state.subscribe();
        wait_until(&mut rx, |done| done.contains(id)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_complete_is_idempotent() {
        let flags = SequenceFlags::new();
        assert!(!flags.is_complete("intro"));
        assert!(flags.complete("intro"));
        assert!(!flags.complete("intro"));
        assert!(flags.is_complete("intro"));
        assert!(!flags.is_complete("outro"));
    }

    #[tokio::test]
    async fn test_wait_complete() {
        let flags = SequenceFlags::new();
        let waiter = {
            let flags = flags.clone();
            tokio::spawn(async move { flags.wait_complete("low-battery").await })
        };

        flags.complete("other");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        flags.complete("low-battery");
        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }
}
