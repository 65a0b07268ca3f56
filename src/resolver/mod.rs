//! Identity resolution.
//!
//! # Data Flow
//! ```text
//! request parameter
//!     → validate presence / shape       (no I/O)
//!     → DomainPolicy::is_served_domain  (tls-check, check-handle)
//!     → AccountDirectory::get_account   (single call, no retry)
//!     → outcome or ResolveError
//! ```
//!
//! # Design Decisions
//! - Policy is consulted strictly before lookup, so unserved domains never
//!   reveal whether an account exists and never cost a store query
//! - Directory failures become `ResolveError::Internal`; the cause stays
//!   server-side
//! - WebFinger does not check the `@host` part against policy

pub mod error;
pub mod resource;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::directory::{Account, AccountDirectory};
use crate::policy::DomainPolicy;

pub use error::ResolveError;
pub use resource::{parse_acct, AcctUri, ResourceError};

use error::{
    ACCOUNT_NOT_FOUND, BAD_DOMAIN_PARAM, DOMAIN_NOT_SERVED, HANDLE_NOT_FOUND, INVALID_RESOURCE,
    MISSING_RESOURCE, WEBFINGER_NOT_CONFIGURED,
};

/// Link relation advertised for the OpenID issuer.
pub const OPENID_ISSUER_REL: &str = "http://openid.net/specs/connect/1.0/issuer";

/// A JSON Resource Descriptor returned by WebFinger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebfingerDocument {
    pub subject: String,
    pub links: Vec<WebfingerLink>,
}

/// A single JRD link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebfingerLink {
    pub rel: String,
    pub href: String,
}

/// Resolves domains and `acct:` resources against the account directory.
#[derive(Clone)]
pub struct IdentityResolver {
    policy: DomainPolicy,
    directory: Arc<dyn AccountDirectory>,
    issuer: Option<String>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("policy", &self.policy)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl IdentityResolver {
    pub fn new(
        policy: DomainPolicy,
        directory: Arc<dyn AccountDirectory>,
        issuer: Option<String>,
    ) -> Self {
        Self {
            policy,
            directory,
            issuer,
        }
    }

    pub fn policy(&self) -> &DomainPolicy {
        &self.policy
    }

    /// Confirm that a certificate may be issued for `domain`.
    ///
    /// The service hostname is accepted without touching the directory.
    pub async fn check_tls(&self, domain: Option<&str>) -> Result<(), ResolveError> {
        let domain = present(domain).ok_or(ResolveError::InvalidRequest(BAD_DOMAIN_PARAM))?;

        if self.policy.is_service_hostname(domain) {
            return Ok(());
        }

        self.lookup_served(domain).await.map(|_| ())
    }

    /// Resolve a served domain to the account whose handle it is.
    pub async fn check_handle(&self, domain: Option<&str>) -> Result<Account, ResolveError> {
        let domain = present(domain).ok_or(ResolveError::InvalidRequest(BAD_DOMAIN_PARAM))?;
        self.lookup_served(domain).await
    }

    /// Produce the WebFinger document for an `acct:` resource.
    ///
    /// The subject echoes `resource` exactly as received.
    pub async fn webfinger(&self, resource: Option<&str>) -> Result<WebfingerDocument, ResolveError> {
        let resource = present(resource).ok_or(ResolveError::InvalidRequest(MISSING_RESOURCE))?;
        let acct = parse_acct(resource).map_err(|e| {
            tracing::debug!(error = %e, "Rejected webfinger resource");
            ResolveError::InvalidRequest(INVALID_RESOURCE)
        })?;

        let issuer = self
            .issuer
            .as_deref()
            .ok_or(ResolveError::NotFound(WEBFINGER_NOT_CONFIGURED))?;

        if self.directory.get_account(acct.handle).await?.is_none() {
            return Err(ResolveError::NotFound(ACCOUNT_NOT_FOUND));
        }

        Ok(WebfingerDocument {
            subject: resource.to_string(),
            links: vec![WebfingerLink {
                rel: OPENID_ISSUER_REL.to_string(),
                href: issuer.to_string(),
            }],
        })
    }

    async fn lookup_served(&self, domain: &str) -> Result<Account, ResolveError> {
        if !self.policy.is_served_domain(domain) {
            return Err(ResolveError::InvalidRequest(DOMAIN_NOT_SERVED));
        }

        self.directory
            .get_account(domain)
            .await?
            .ok_or(ResolveError::NotFound(HANDLE_NOT_FOUND))
    }
}

/// An empty parameter counts as absent.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
