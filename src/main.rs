//! Handle gateway.
//!
//! Fronts an account directory with the handle-resolution endpoints and
//! shuts down cleanly on SIGTERM.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌──────────────────────────────────────────────┐
//!     ──────────────────────┼─▶ http (tls-check / check-handle / webfinger) │
//!                           │        │                                     │
//!                           │        ▼                                     │
//!                           │   policy ──▶ resolver ──▶ directory          │
//!                           │                                              │
//!     SIGTERM               │  ┌────────────────────────────────────────┐  │
//!     ──────────────────────┼─▶│ lifecycle: startup / coordinator       │  │
//!                           │  └────────────────────────────────────────┘  │
//!                           └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use handle_gateway::config::load_config;
use handle_gateway::directory::{AccountDirectory, MemoryDirectory};
use handle_gateway::lifecycle::{signals, startup, Coordinator, StartupError};
use handle_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "handle-gateway")]
#[command(about = "Handle resolution and WebFinger discovery in front of an account directory", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability);

    if cli.check {
        tracing::info!("Configuration is valid");
        return Ok(());
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "handle-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        hostname = %config.service.hostname,
        grace_period_secs = config.lifecycle.grace_period_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics endpoint");
        }
    }

    let directory = MemoryDirectory::from_config(&config.directory)?;
    let migrator: Option<Arc<dyn AccountDirectory>> = if directory.requires_privileged_migrations() {
        Some(Arc::new(directory.migration_handle()))
    } else {
        None
    };
    let directory: Arc<dyn AccountDirectory> = Arc::new(directory);

    let coordinator = Arc::new(Coordinator::new(
        Arc::clone(&directory),
        Duration::from_secs(config.lifecycle.grace_period_secs),
    ));
    signals::install(Arc::clone(&coordinator))?;

    match startup::run(&coordinator, &config, directory, migrator).await {
        Ok(()) => {}
        Err(StartupError::Interrupted) => {
            coordinator.stopped().await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    coordinator.wait().await?;
    Ok(())
}
