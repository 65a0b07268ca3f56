//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_resolutions_total` (counter): requests by endpoint, status
//! - `gateway_resolution_duration_seconds` (histogram): latency by endpoint
//! - `gateway_lifecycle_state` (gauge): 0=starting 1=running 2=stopping 3=stopped
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup
//! - Prometheus exposition runs on its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::lifecycle::LifecycleState;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(&[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5])?
        .install()?;

    describe_counter!(
        "gateway_resolutions_total",
        "Resolution requests by endpoint and status"
    );
    describe_histogram!(
        "gateway_resolution_duration_seconds",
        "Resolution request duration in seconds"
    );
    describe_gauge!("gateway_lifecycle_state", "Current lifecycle state");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed resolution request.
pub fn record_resolution(endpoint: &'static str, status: u16, start: Instant) {
    counter!(
        "gateway_resolutions_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_resolution_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

/// Publish the current lifecycle state.
pub fn record_lifecycle_state(state: LifecycleState) {
    gauge!("gateway_lifecycle_state").set(state as u8 as f64);
}
