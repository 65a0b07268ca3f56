//! Shutdown signal fan-out.
//!
//! Two phases: `trigger` asks tasks to drain, `force` tells them to drop
//! whatever is still in flight.

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Provides watch channels that all long-running tasks can subscribe to.
/// Unlike a broadcast, a subscriber created after the trigger still observes
/// it.
#[derive(Debug)]
pub struct Shutdown {
    drain: watch::Sender<bool>,
    force: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (drain, _) = watch::channel(false);
        let (force, _) = watch::channel(false);
        Self { drain, force }
    }

    /// Subscribe to both phases.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            drain: self.drain.subscribe(),
            force: self.force.subscribe(),
        }
    }

    /// Start draining. Repeated triggers are harmless.
    pub fn trigger(&self) {
        self.drain.send_replace(true);
    }

    /// Abandon in-flight work. Implies `trigger`.
    pub fn force(&self) {
        self.drain.send_replace(true);
        self.force.send_replace(true);
    }

    /// Whether shutdown has been triggered.
    pub fn is_triggered(&self) -> bool {
        *self.drain.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a [`Shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    drain: watch::Receiver<bool>,
    force: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once draining starts, or the coordinator is dropped.
    pub async fn recv(&mut self) {
        let _ = self.drain.wait_for(|triggered| *triggered).await;
    }

    /// Resolve once in-flight work must be dropped, or the coordinator is
    /// dropped.
    pub async fn forced(&mut self) {
        let _ = self.force.wait_for(|forced| *forced).await;
    }
}
