//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject handle domains that would match every name
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service.hostname must not be empty")]
    EmptyHostname,

    #[error("service.hostname must be a bare hostname, got {0:?}")]
    MalformedHostname(String),

    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("identity.service_handle_domains[{0}] is empty")]
    EmptyHandleDomain(usize),

    #[error("discovery.issuer {0:?} is not an absolute http(s) URL")]
    Issuer(String),

    #[error("lifecycle.grace_period_secs must be greater than zero")]
    GracePeriod,

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let hostname = &config.service.hostname;
    if hostname.is_empty() {
        errors.push(ValidationError::EmptyHostname);
    } else if hostname.contains(|c: char| c == '/' || c == ':' || c.is_whitespace()) {
        errors.push(ValidationError::MalformedHostname(hostname.clone()));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    for (i, domain) in config.identity.service_handle_domains.iter().enumerate() {
        if domain.is_empty() {
            errors.push(ValidationError::EmptyHandleDomain(i));
        }
    }

    if let Some(issuer) = &config.discovery.issuer {
        let valid = Url::parse(issuer)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::Issuer(issuer.clone()));
        }
    }

    if config.lifecycle.grace_period_secs == 0 {
        errors.push(ValidationError::GracePeriod);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
