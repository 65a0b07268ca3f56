//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Accept connections until the shutdown signal fires, then drain them
//!
//! # Design Decisions
//! - Connection tasks live in one `JoinSet` owned by `run`; a forced
//!   shutdown aborts them all before `run` returns
//! - HTTP/1 only; requests are served inside their connection task

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::handlers::{self, AppState};
use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::lifecycle::{ShutdownSignal, StateCell};
use crate::resolver::IdentityResolver;

/// Pause after a failed accept.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a resolver.
    pub fn new(config: &GatewayConfig, resolver: IdentityResolver, lifecycle: Arc<StateCell>) -> Self {
        let state = AppState {
            resolver,
            lifecycle,
        };
        let router = build_router(state, Duration::from_secs(config.timeouts.request_secs));
        Self { router }
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Once `shutdown` starts draining, the listener is closed and open
    /// connections finish their current request. If shutdown is forced
    /// first, the remaining connections are aborted. Either way no
    /// connection task outlives this call.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let graceful = GracefulShutdown::new();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                            continue;
                        }
                    };

                    let service = TowerToHyperService::new(self.router.clone());
                    let conn = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .serve_connection(TokioIo::new(stream), service);
                    let conn = graceful.watch(conn);

                    connections.spawn(async move {
                        if let Err(e) = conn.await {
                            tracing::debug!(peer_addr = %peer, error = %e, "Connection ended with error");
                        }
                    });
                }
            }
        }

        drop(listener);
        tracing::info!(open_connections = connections.len(), "HTTP server draining");

        tokio::select! {
            _ = graceful.shutdown() => {
                tracing::info!("HTTP server drained");
            }
            _ = shutdown.forced() => {
                tracing::warn!(
                    open_connections = connections.len(),
                    "Aborting connections still in flight"
                );
            }
        }
        connections.shutdown().await;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/tls-check", get(handlers::tls_check))
        .route("/check-handle", get(handlers::check_handle))
        .route("/.well-known/webfinger", get(handlers::webfinger))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(set_request_id_layer())
}
