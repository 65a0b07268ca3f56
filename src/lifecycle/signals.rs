//! OS signal handling.
//!
//! # Responsibilities
//! - Register the SIGTERM handler
//! - Forward every delivery to the coordinator
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Each delivery is forwarded; idempotence lives in the coordinator's
//!   state latch, not here
//! - SIGTERM only; other signals keep their default disposition

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::lifecycle::coordinator::Coordinator;

/// Install the SIGTERM handler and forward deliveries to `coordinator`.
///
/// Returns the listening task. Fails if the handler cannot be registered.
#[cfg(unix)]
pub fn install(coordinator: Arc<Coordinator>) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tracing::debug!("SIGTERM handler installed");

    Ok(tokio::spawn(async move {
        while terminate.recv().await.is_some() {
            tracing::info!("Received SIGTERM signal");
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.on_termination_signal().await });
        }
    }))
}

/// Non-unix targets have no SIGTERM; the listener never fires.
#[cfg(not(unix))]
pub fn install(coordinator: Arc<Coordinator>) -> std::io::Result<JoinHandle<()>> {
    tracing::warn!("SIGTERM is not available on this platform");
    Ok(tokio::spawn(async move {
        let _coordinator = coordinator;
        std::future::pending::<()>().await;
    }))
}
