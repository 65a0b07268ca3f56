//! Lifecycle coordinator.
//!
//! Owns the state machine, the running server task and the directory handle,
//! and runs the ordered shutdown sequence exactly once.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::directory::AccountDirectory;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::state::{LifecycleState, StateCell};
use crate::observability::metrics;

/// How long a forced server gets to abort its connections.
const FORCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from lifecycle transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("cannot mark running from state {0}")]
    NotStarting(LifecycleState),

    #[error("HTTP server exited before shutdown was requested")]
    ServerExited,
}

/// Drives the gateway through `Starting → Running → Stopping → Stopped`.
pub struct Coordinator {
    state: Arc<StateCell>,
    shutdown: Shutdown,
    grace_period: Duration,
    directory: Arc<dyn AccountDirectory>,
    server: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
    server_exited: Arc<watch::Sender<bool>>,
    local_addr: OnceLock<SocketAddr>,
    stopped: watch::Sender<bool>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &self.state.get())
            .field("grace_period", &self.grace_period)
            .field("local_addr", &self.local_addr.get())
            .finish_non_exhaustive()
    }
}

/// Held by the server task; marks the server as gone when dropped.
///
/// Dropping covers a normal return, an error, a panic and an abort alike.
#[derive(Debug)]
pub struct ServerExitGuard {
    exited: Arc<watch::Sender<bool>>,
}

impl Drop for ServerExitGuard {
    fn drop(&mut self) {
        self.exited.send_replace(true);
    }
}

impl Coordinator {
    /// Create a coordinator in the `Starting` state.
    pub fn new(directory: Arc<dyn AccountDirectory>, grace_period: Duration) -> Self {
        let (stopped, _) = watch::channel(false);
        let (server_exited, _) = watch::channel(false);
        metrics::record_lifecycle_state(LifecycleState::Starting);
        Self {
            state: Arc::new(StateCell::new()),
            shutdown: Shutdown::new(),
            grace_period,
            directory,
            server: Mutex::new(None),
            server_exited: Arc::new(server_exited),
            local_addr: OnceLock::new(),
            stopped,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Shared view of the state, for health reporting.
    pub fn state_cell(&self) -> Arc<StateCell> {
        Arc::clone(&self.state)
    }

    /// The shutdown fan-out the server listens on.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Address the server is bound to, once attached.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Guard to move into the server task before spawning it.
    pub fn server_exit_guard(&self) -> ServerExitGuard {
        ServerExitGuard {
            exited: Arc::clone(&self.server_exited),
        }
    }

    /// Hand over the running server task.
    pub async fn attach_server(&self, addr: SocketAddr, handle: JoinHandle<std::io::Result<()>>) {
        let _ = self.local_addr.set(addr);
        *self.server.lock().await = Some(handle);
    }

    /// `Starting → Running`, once the listener is bound and the directory
    /// is migrated.
    pub fn mark_running(&self) -> Result<(), LifecycleError> {
        self.state
            .transition(LifecycleState::Starting, LifecycleState::Running)
            .map_err(LifecycleError::NotStarting)?;
        metrics::record_lifecycle_state(LifecycleState::Running);
        tracing::info!(address = ?self.local_addr(), "Gateway running");
        Ok(())
    }

    /// Handle a termination signal.
    ///
    /// The first call runs the shutdown sequence to completion; any call made
    /// while stopping or stopped returns immediately.
    pub async fn on_termination_signal(&self) {
        self.stop("termination signal").await;
    }

    /// Run the shutdown sequence once, for any `reason`.
    pub(crate) async fn stop(&self, reason: &'static str) {
        let from = match self
            .state
            .transition(LifecycleState::Running, LifecycleState::Stopping)
        {
            Ok(()) => LifecycleState::Running,
            Err(LifecycleState::Starting) => {
                match self
                    .state
                    .transition(LifecycleState::Starting, LifecycleState::Stopping)
                {
                    Ok(()) => LifecycleState::Starting,
                    Err(current) => {
                        tracing::debug!(state = %current, reason, "Stop ignored, already shutting down");
                        return;
                    }
                }
            }
            Err(current) => {
                tracing::debug!(state = %current, reason, "Stop ignored, already shutting down");
                return;
            }
        };

        metrics::record_lifecycle_state(LifecycleState::Stopping);
        tracing::info!(
            from = %from,
            reason,
            grace_period_secs = self.grace_period.as_secs_f64(),
            "Shutting down"
        );

        // 1. Stop accepting; the server drains in-flight requests.
        self.shutdown.trigger();

        // 2. Wait for the drain, bounded by the grace period. Past it, the
        //    server aborts its connections before returning.
        if let Some(mut handle) = self.server.lock().await.take() {
            match tokio::time::timeout(self.grace_period, &mut handle).await {
                Ok(result) => log_server_exit(result),
                Err(_) => {
                    tracing::warn!(
                        grace_period_secs = self.grace_period.as_secs_f64(),
                        "Grace period elapsed, abandoning in-flight requests"
                    );
                    self.shutdown.force();
                    match tokio::time::timeout(FORCE_TIMEOUT, &mut handle).await {
                        Ok(result) => log_server_exit(result),
                        Err(_) => {
                            tracing::error!("HTTP server ignored forced shutdown, aborting task");
                            handle.abort();
                            let _ = handle.await;
                        }
                    }
                }
            }
        }

        // 3. Release the directory. No request work is left running.
        if let Err(e) = self.directory.close().await {
            tracing::error!(error = %e, "Failed to close account directory");
        }

        // 4. Done.
        if let Err(current) = self
            .state
            .transition(LifecycleState::Stopping, LifecycleState::Stopped)
        {
            tracing::error!(state = %current, "Unexpected state at end of shutdown");
        }
        metrics::record_lifecycle_state(LifecycleState::Stopped);
        self.stopped.send_replace(true);
        tracing::info!("Shutdown complete");
    }

    /// Resolve once the shutdown sequence has finished.
    pub async fn stopped(&self) {
        let mut rx = self.stopped.subscribe();
        let _ = rx.wait_for(|stopped| *stopped).await;
    }

    /// Run until stopped.
    ///
    /// If the server task ends without shutdown having been requested, the
    /// shutdown sequence runs anyway and `ServerExited` is returned.
    pub async fn wait(&self) -> Result<(), LifecycleError> {
        let mut exited = self.server_exited.subscribe();
        tokio::select! {
            _ = self.stopped() => Ok(()),
            _ = async {
                let _ = exited.wait_for(|exited| *exited).await;
            } => {
                if self.shutdown.is_triggered() {
                    self.stopped().await;
                    return Ok(());
                }
                tracing::error!("HTTP server exited unexpectedly, shutting down");
                self.stop("server exited").await;
                self.stopped().await;
                Err(LifecycleError::ServerExited)
            }
        }
    }
}

fn log_server_exit(result: Result<std::io::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => tracing::info!("HTTP server finished"),
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server exited with error"),
        Err(e) => tracing::error!(error = %e, "HTTP server task failed"),
    }
}
