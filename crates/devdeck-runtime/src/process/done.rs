//! One-shot completion signal for a process instance.

use tokio::sync::watch;

/// Waitable handle that completes once the OS process has been reaped.
///
/// Cheap to clone; any number of tasks may wait concurrently.
#[derive(Debug, Clone)]
pub struct DoneSignal {
    rx: watch::Receiver<bool>,
}

/// The firing side. Consumed by [`DoneTrigger::fire`], so it fires at most once.
#[derive(Debug)]
pub(crate) struct DoneTrigger {
    tx: watch::Sender<bool>,
}

/// Create a linked trigger/signal pair.
pub(crate) fn done_pair() -> (DoneTrigger, DoneSignal) {
    let (tx, rx) = watch::channel(false);
    (DoneTrigger { tx }, DoneSignal { rx })
}

impl DoneTrigger {
    pub(crate) fn fire(self) {
        self.tx.send_replace(true);
    }
}

impl DoneSignal {
    /// Wait until the process is done.
    ///
    /// Also returns if the trigger was dropped without firing, which only
    /// happens when the supervising task itself died.
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|done| *done).await;
    }

    /// Whether the signal has already completed.
    pub fn is_done(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_all_waiters_release_on_fire() {
        let (trigger, signal) = done_pair();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let mut s = signal.clone();
                tokio::spawn(async move { s.wait().await })
            })
            .collect();

        assert!(!signal.is_done());
        trigger.fire();

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter not released")
                .unwrap();
        }
        assert!(signal.is_done());
    }

    #[tokio::test]
    async fn test_wait_after_fire_returns_immediately() {
        let (trigger, mut signal) = done_pair();
        trigger.fire();
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("late waiter blocked");
    }

    #[tokio::test]
    async fn test_dropped_trigger_releases_waiters() {
        let (trigger, mut signal) = done_pair();
        drop(trigger);
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("waiter blocked on dropped trigger");
    }
}
