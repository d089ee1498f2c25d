//! Shutdown coordination for the gateway.
//!
//! The coordinator holds a single "stopping" flag. Servers and background
//! tasks each hold a [`ShutdownSignal`] and await it; once the flag is set,
//! every signal resolves, including signals handed out afterwards.

use tokio::sync::watch;

/// Owner of the stopping flag.
pub struct Shutdown {
    stopping: watch::Sender<bool>,
}

/// One task's view of the stopping flag.
#[derive(Clone)]
pub struct ShutdownSignal {
    stopping: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (stopping, _) = watch::channel(false);
        Self { stopping }
    }

    /// Hand out a signal for one more task.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            stopping: self.stopping.subscribe(),
        }
    }

    /// Ask every holder of a signal to stop. Idempotent.
    pub fn trigger(&self) {
        if !self.stopping.send_replace(true) {
            tracing::info!(tasks = self.stopping.receiver_count(), "Gateway shutdown requested");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.stopping.borrow()
    }

    /// Signals still held by running tasks.
    pub fn receiver_count(&self) -> usize {
        self.stopping.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Resolve once shutdown is triggered or the coordinator is gone.
    pub async fn recv(&mut self) {
        let _ = self.stopping.wait_for(|stopping| *stopping).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_every_task() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);
        assert!(!shutdown.is_triggered());

        shutdown.trigger();
        a.recv().await;
        b.recv().await;
        assert!(shutdown.is_triggered());

        drop(a);
        assert_eq!(shutdown.receiver_count(), 1);
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();

        let mut late = shutdown.subscribe();
        tokio::time::timeout(Duration::from_secs(1), late.recv()).await.unwrap();
    }

    #[tokio::test]
    async fn test_waits_until_triggered() {
        let shutdown = Shutdown::default();
        let mut signal = shutdown.subscribe();
        assert!(tokio::time::timeout(Duration::from_millis(50), signal.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_dropped_coordinator_releases_tasks() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        drop(shutdown);
        tokio::time::timeout(Duration::from_secs(1), signal.recv()).await.unwrap();
    }
}
