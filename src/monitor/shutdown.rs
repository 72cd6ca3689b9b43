// src/monitor/shutdown.rs
// =============================================================================
// Cooperative shutdown.
//
// Ctrl-C flips a flag. The poll loop checks it between targets and between
// cycles, and the inter-cycle sleep wakes up early when it flips. A delivery
// that is already in progress always runs to its end.
// =============================================================================

use std::time::Duration;

use tokio::sync::watch;

/// Sending half, owned by whoever listens for the signal.
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // Nobody listening any more means nobody to stop
        let _ = self.tx.send(true);
    }
}

/// Receiving half, checked by the poll loop.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl Shutdown {
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleeps for `duration`, or less if shutdown is requested meanwhile.
    pub async fn sleep(&self, duration: Duration) {
        let mut rx = self.rx.clone();
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            Ok(_) = rx.wait_for(|stop| *stop) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_runs_full_duration_without_signal() {
        let (_trigger, shutdown) = channel();
        let start = Instant::now();
        shutdown.sleep(Duration::from_secs(60)).await;
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert!(!shutdown.is_requested());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_wakes_sleep_early() {
        let (trigger, shutdown) = channel();
        let start = Instant::now();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.trigger();
        });
        shutdown.sleep(Duration::from_secs(3600)).await;
        assert!(start.elapsed() < Duration::from_secs(3600));
        assert!(shutdown.is_requested());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_trigger_does_not_cut_sleep_short() {
        let (trigger, shutdown) = channel();
        drop(trigger);
        let start = Instant::now();
        shutdown.sleep(Duration::from_secs(10)).await;
        assert!(start.elapsed() >= Duration::from_secs(10));
    }
}
