//! Domain policy evaluation.
//!
//! Decides whether this instance is authoritative for a domain or handle.
//!
//! # Design Decisions
//! - Matching is case-sensitive string suffix comparison, no DNS or wildcards
//! - The canonical service hostname is always served
//! - Empty inputs never match (fail closed)

use crate::config::GatewayConfig;

/// Which domains this instance serves handles for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPolicy {
    hostname: String,
    handle_domains: Vec<String>,
}

impl DomainPolicy {
    /// Create a policy from the canonical hostname and ordered suffixes.
    pub fn new(hostname: impl Into<String>, handle_domains: Vec<String>) -> Self {
        Self {
            hostname: hostname.into(),
            handle_domains,
        }
    }

    /// Build the policy in effect for a configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.service.hostname.clone(), config.handle_domains())
    }

    /// The canonical service hostname.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Configured handle suffixes, in order.
    pub fn handle_domains(&self) -> &[String] {
        &self.handle_domains
    }

    /// Whether `domain` is the canonical service hostname.
    pub fn is_service_hostname(&self, domain: &str) -> bool {
        !domain.is_empty() && domain == self.hostname
    }

    /// Whether this instance is authoritative for `domain`.
    pub fn is_served_domain(&self, domain: &str) -> bool {
        if domain.is_empty() {
            return false;
        }
        if domain == self.hostname {
            return true;
        }
        self.handle_domains
            .iter()
            .any(|suffix| !suffix.is_empty() && domain.ends_with(suffix.as_str()))
    }
}
