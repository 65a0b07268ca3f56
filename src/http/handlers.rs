//! Endpoint handlers.
//!
//! Each handler pulls its parameter from the raw query, delegates to the
//! injected [`IdentityResolver`] and records one metrics sample.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::directory::Account;
use crate::http::request::single_param;
use crate::http::response::{status_for, ApiError, DiscoveryError, Jrd, SuccessResponse};
use crate::lifecycle::{LifecycleState, StateCell};
use crate::observability::metrics;
use crate::resolver::{IdentityResolver, ResolveError};

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub resolver: IdentityResolver,
    pub lifecycle: Arc<StateCell>,
}

fn record<T>(endpoint: &'static str, result: &Result<T, ResolveError>, start: Instant) {
    let status = match result {
        Ok(_) => StatusCode::OK,
        Err(e) => status_for(e),
    };
    metrics::record_resolution(endpoint, status.as_u16(), start);
}

/// `GET /tls-check?domain=`
pub async fn tls_check(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<SuccessResponse>, ApiError> {
    let start = Instant::now();
    let domain = single_param(query.as_deref(), "domain");

    let result = state.resolver.check_tls(domain.as_deref()).await;
    record("tls_check", &result, start);
    tracing::debug!(domain = ?domain, ok = result.is_ok(), "tls-check");

    result?;
    Ok(Json(SuccessResponse::ok()))
}

/// `GET /check-handle?domain=`
pub async fn check_handle(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Account>, ApiError> {
    let start = Instant::now();
    let domain = single_param(query.as_deref(), "domain");

    let result = state.resolver.check_handle(domain.as_deref()).await;
    record("check_handle", &result, start);

    Ok(Json(result?))
}

/// `GET /.well-known/webfinger?resource=`
pub async fn webfinger(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Jrd, DiscoveryError> {
    let start = Instant::now();
    let resource = single_param(query.as_deref(), "resource");

    let result = state.resolver.webfinger(resource.as_deref()).await;
    record("webfinger", &result, start);

    Ok(Jrd(result?))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// `GET /health`: 200 while running, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let current = state.lifecycle.get();
    let code = if current == LifecycleState::Running {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthResponse {
            status: current.as_str(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
        .into_response()
}
