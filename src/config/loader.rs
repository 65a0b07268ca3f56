//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, overlay the environment,
/// then validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env(&mut config, |key| std::env::var(key).ok())?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto a configuration.
///
/// `lookup` abstracts `std::env::var` so the mapping can be tested without
/// touching process state.
pub fn apply_env<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(hostname) = lookup("PDS_HOSTNAME") {
        config.service.hostname = hostname;
    }

    if let Some(port) = lookup("PDS_PORT") {
        let port: u16 = port.parse().map_err(|_| ConfigError::Env {
            var: "PDS_PORT",
            value: port.clone(),
        })?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }

    if let Some(domains) = lookup("PDS_SERVICE_HANDLE_DOMAINS") {
        config.identity.service_handle_domains = domains
            .split(',')
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
    }

    if let Some(issuer) = lookup("PDS_OIDC_ISSUER") {
        config.discovery.issuer = if issuer.is_empty() { None } else { Some(issuer) };
    }

    if let Some(secs) = lookup("PDS_SHUTDOWN_GRACE_SECS") {
        config.lifecycle.grace_period_secs = secs.parse().map_err(|_| ConfigError::Env {
            var: "PDS_SHUTDOWN_GRACE_SECS",
            value: secs.clone(),
        })?;
    }

    if let Some(path) = lookup("PDS_ACCOUNTS_PATH") {
        config.directory.accounts_path = Some(path);
    }

    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    Ok(())
}
