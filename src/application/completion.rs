//! Join-with-timeout over the providers dispatched for one generation.
//!
//! Each dispatched provider holds a pending flag. A generation completes when
//! every flag is cleared or when the timeout elapses, whichever comes first.
//! On timeout the remaining flags are force-cleared; those providers simply
//! contribute nothing.

use crate::domain::model::ProviderId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Every provider settled.
    Completed,
    /// The timeout elapsed first; `abandoned` were still pending.
    ForcedCompleted { abandoned: Vec<ProviderId> },
}

#[derive(Debug, Clone)]
pub struct CompletionDetector {
    timeout: Duration,
}

impl CompletionDetector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Registers a generation with its dispatched providers.
    pub fn register<I>(&self, providers: I) -> (PendingSet, CompletionWaiter)
    where
        I: IntoIterator<Item = ProviderId>,
    {
        let pending: HashSet<ProviderId> = providers.into_iter().collect();
        let (tx, rx) = watch::channel(pending.len());
        let set = PendingSet {
            inner: Arc::new(PendingInner {
                pending: Mutex::new(pending),
                remaining: tx,
            }),
        };
        let waiter = CompletionWaiter {
            set: set.clone(),
            remaining: rx,
            timeout: self.timeout,
        };
        (set, waiter)
    }
}

impl Default for CompletionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[derive(Debug)]
struct PendingInner {
    pending: Mutex<HashSet<ProviderId>>,
    remaining: watch::Sender<usize>,
}

/// Pending flags of one generation. Cheap to clone into provider tasks.
#[derive(Debug, Clone)]
pub struct PendingSet {
    inner: Arc<PendingInner>,
}

impl PendingSet {
    /// Clears a provider's flag. Returns `false` if it was not pending.
    pub fn settle(&self, provider: &ProviderId) -> bool {
        let mut pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let removed = pending.remove(provider);
        if removed {
            self.inner.remaining.send_replace(pending.len());
        }
        removed
    }

    pub fn is_pending(&self, provider: &ProviderId) -> bool {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(provider)
    }

    pub fn pending(&self) -> Vec<ProviderId> {
        let pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut ids: Vec<ProviderId> = pending.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_settled(&self) -> bool {
        *self.inner.remaining.borrow() == 0
    }

    fn force_clear(&self) -> Vec<ProviderId> {
        let mut pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut abandoned: Vec<ProviderId> = pending.drain().collect();
        abandoned.sort();
        self.inner.remaining.send_replace(0);
        abandoned
    }
}

/// Fires once: `wait` consumes the waiter.
#[derive(Debug)]
pub struct CompletionWaiter {
    set: PendingSet,
    remaining: watch::Receiver<usize>,
    timeout: Duration,
}

impl CompletionWaiter {
    pub async fn wait(mut self) -> Completion {
        let all_settled = tokio::time::timeout(self.timeout, self.remaining.wait_for(|n| *n == 0))
            .await
            .is_ok();

        if all_settled {
            Completion::Completed
        } else {
            Completion::ForcedCompleted {
                abandoned: self.set.force_clear(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ProviderId> {
        names.iter().map(|n| ProviderId::new(*n)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_when_all_settle() {
        let detector = CompletionDetector::new(Duration::from_secs(10));
        let (set, waiter) = detector.register(ids(&["google", "gemini:auto"]));

        let settler = set.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            settler.settle(&ProviderId::new("google"));
            tokio::time::sleep(Duration::from_millis(300)).await;
            settler.settle(&ProviderId::new("gemini:auto"));
        });

        let started = tokio::time::Instant::now();
        assert_eq!(waiter.wait().await, Completion::Completed);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(set.is_settled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_and_clears_pending() {
        let detector = CompletionDetector::new(Duration::from_millis(10_000));
        let (set, waiter) = detector.register(ids(&["google", "gemini:auto"]));
        set.settle(&ProviderId::new("google"));

        let started = tokio::time::Instant::now();
        let completion = waiter.wait().await;
        assert_eq!(
            completion,
            Completion::ForcedCompleted {
                abandoned: ids(&["gemini:auto"])
            }
        );
        assert!(started.elapsed() >= Duration::from_millis(10_000));
        assert!(set.pending().is_empty());
        // a late settle loses to the forced clear
        assert!(!set.settle(&ProviderId::new("gemini:auto")));
    }

    #[tokio::test]
    async fn test_empty_set_completes_immediately() {
        let (_set, waiter) = CompletionDetector::default().register(Vec::new());
        assert_eq!(waiter.wait().await, Completion::Completed);
    }

    #[test]
    fn test_settle_is_idempotent() {
        let (set, _waiter) = CompletionDetector::default().register(ids(&["google"]));
        assert!(set.settle(&ProviderId::new("google")));
        assert!(!set.settle(&ProviderId::new("google")));
        assert!(!set.settle(&ProviderId::new("unknown")));
    }
}
