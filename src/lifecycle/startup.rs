//! Startup orchestration.
//!
//! # Responsibilities
//! - Migrate the directory schema (privileged handle when configured)
//! - Bind the listener and spawn the HTTP server
//! - Mark the coordinator running
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and stops the coordinator
//! - A termination signal during startup wins over binding
//! - Migration completes before the listener is bound, so no request can
//!   observe an unmigrated store
//! - The migration handle is closed before traffic is accepted

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::directory::{AccountDirectory, DirectoryError};
use crate::http::HttpServer;
use crate::lifecycle::coordinator::Coordinator;
use crate::lifecycle::state::LifecycleState;
use crate::policy::DomainPolicy;
use crate::resolver::IdentityResolver;

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("directory migration failed: {0}")]
    Migration(#[source] DirectoryError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("shutdown requested during startup")]
    Interrupted,
}

/// Create a coordinator and start the gateway on it.
///
/// `migrator` is a separate migration-privileged handle; when `None` the
/// runtime `directory` migrates itself.
pub async fn start(
    config: &GatewayConfig,
    directory: Arc<dyn AccountDirectory>,
    migrator: Option<Arc<dyn AccountDirectory>>,
) -> Result<Arc<Coordinator>, StartupError> {
    let coordinator = Arc::new(Coordinator::new(
        Arc::clone(&directory),
        Duration::from_secs(config.lifecycle.grace_period_secs),
    ));
    run(&coordinator, config, directory, migrator).await?;
    Ok(coordinator)
}

/// Migrate, bind, serve, on a coordinator that may already be receiving
/// termination signals.
///
/// `directory` must be the handle the coordinator was created with. On any
/// failure the coordinator has been stopped by the time this returns. If a
/// signal arrives before the gateway is running, returns `Interrupted`.
pub async fn run(
    coordinator: &Arc<Coordinator>,
    config: &GatewayConfig,
    directory: Arc<dyn AccountDirectory>,
    migrator: Option<Arc<dyn AccountDirectory>>,
) -> Result<(), StartupError> {
    let migrated = migrate(directory.as_ref(), migrator.as_deref()).await;
    if coordinator.state() != LifecycleState::Starting {
        tracing::info!("Shutdown requested during migration, not binding");
        return Err(StartupError::Interrupted);
    }
    if let Err(e) = migrated {
        coordinator.stop("migration failed").await;
        return Err(StartupError::Migration(e));
    }

    let (listener, local_addr) = match bind(&config.listener.bind_address).await {
        Ok(bound) => bound,
        Err(e) => {
            coordinator.stop("bind failed").await;
            return Err(e);
        }
    };

    let resolver = IdentityResolver::new(
        DomainPolicy::from_config(config),
        directory,
        config.discovery.issuer.clone(),
    );
    tracing::info!(
        hostname = %resolver.policy().hostname(),
        handle_domains = ?resolver.policy().handle_domains(),
        webfinger = config.discovery.issuer.is_some(),
        "Identity resolver configured"
    );

    let server = HttpServer::new(config, resolver, coordinator.state_cell());
    let signal = coordinator.shutdown().subscribe();
    let guard = coordinator.server_exit_guard();
    let handle = tokio::spawn(async move {
        let _guard = guard;
        server.run(listener, signal).await
    });
    coordinator.attach_server(local_addr, handle).await;

    coordinator
        .mark_running()
        .map_err(|_| StartupError::Interrupted)
}

async fn bind(address: &str) -> Result<(TcpListener, SocketAddr), StartupError> {
    let to_error = |source| StartupError::Bind {
        address: address.to_string(),
        source,
    };
    let listener = TcpListener::bind(address).await.map_err(to_error)?;
    let local_addr = listener.local_addr().map_err(to_error)?;
    Ok((listener, local_addr))
}

async fn migrate(
    directory: &dyn AccountDirectory,
    migrator: Option<&dyn AccountDirectory>,
) -> Result<(), DirectoryError> {
    match migrator {
        Some(migrator) => {
            tracing::info!("Running migrations on privileged handle");
            let result = migrator.migrate_to_latest().await;
            if let Err(e) = migrator.close().await {
                tracing::warn!(error = %e, "Failed to close migration handle");
            }
            result
        }
        None => {
            tracing::info!("Running migrations");
            directory.migrate_to_latest().await
        }
    }
}
