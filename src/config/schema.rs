//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::directory::Account;

/// Root configuration for the handle gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Identity of the hosted service.
    pub service: ServiceConfig,

    /// Handle domains this instance is authoritative for.
    pub identity: IdentityConfig,

    /// WebFinger discovery settings.
    pub discovery: DiscoveryConfig,

    /// Shutdown behaviour.
    pub lifecycle: LifecycleConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Account directory backend settings.
    pub directory: DirectoryConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:2583").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:2583".to_string(),
        }
    }
}

/// The hosted service this gateway fronts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Canonical public hostname of the service (no scheme, no port).
    pub hostname: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
        }
    }
}

/// Handle hosting configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    /// Ordered domain suffixes handles are served under (e.g. ".bsky.social").
    ///
    /// When empty, [`GatewayConfig::handle_domains`] derives a default from
    /// the service hostname.
    pub service_handle_domains: Vec<String>,
}

/// WebFinger discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// OpenID issuer advertised for discovered accounts. Discovery is
    /// disabled while unset.
    pub issuer: Option<String>,
}

/// Lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Time in-flight requests get to finish once shutdown starts.
    pub grace_period_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 10,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Account directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DirectoryConfig {
    /// JSON file holding an array of `{did, handle}` records.
    pub accounts_path: Option<String>,

    /// Inline account records, merged with `accounts_path`.
    pub accounts: Vec<Account>,

    /// Run schema migrations on a separate, privileged handle instead of
    /// the runtime handle.
    pub privileged_migrations: bool,
}

impl GatewayConfig {
    /// Handle domains in effect.
    ///
    /// Falls back to `.test` for a `localhost` service, otherwise to the
    /// hostname itself as a suffix.
    pub fn handle_domains(&self) -> Vec<String> {
        if !self.identity.service_handle_domains.is_empty() {
            return self.identity.service_handle_domains.clone();
        }
        if self.service.hostname == "localhost" {
            vec![".test".to_string()]
        } else {
            vec![format!(".{}", self.service.hostname)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [service]
            hostname = "pds.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.hostname, "pds.example.com");
        assert_eq!(config.listener.bind_address, "0.0.0.0:2583");
        assert_eq!(config.lifecycle.grace_period_secs, 10);
        assert!(config.discovery.issuer.is_none());
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn handle_domains_default_from_hostname() {
        let mut config = GatewayConfig::default();
        assert_eq!(config.handle_domains(), vec![".test".to_string()]);

        config.service.hostname = "pds.example.com".into();
        assert_eq!(config.handle_domains(), vec![".pds.example.com".to_string()]);

        config.identity.service_handle_domains = vec![".bsky.social".into(), ".example".into()];
        assert_eq!(
            config.handle_domains(),
            vec![".bsky.social".to_string(), ".example".to_string()]
        );
    }

    #[test]
    fn inline_accounts_parse() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [[directory.accounts]]
            did = "did:plc:abc123"
            handle = "alice.bsky.social"
            "#,
        )
        .unwrap();

        assert_eq!(config.directory.accounts.len(), 1);
        assert_eq!(config.directory.accounts[0].handle, "alice.bsky.social");
    }
}
