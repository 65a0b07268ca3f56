//! Resolution error taxonomy.

use thiserror::Error;

use crate::directory::DirectoryError;

/// Failure of a resolution request.
///
/// `InvalidRequest` and `NotFound` carry client-facing text. `Internal`
/// carries the backend cause, which is logged and never sent to clients.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{0}")]
    InvalidRequest(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("directory lookup failed: {0}")]
    Internal(#[from] DirectoryError),
}

impl ResolveError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::InvalidRequest(_) => "InvalidRequest",
            ResolveError::NotFound(_) => "NotFound",
            ResolveError::Internal(_) => "InternalServerError",
        }
    }

    /// Message safe to show a client.
    pub fn public_message(&self) -> &'static str {
        match self {
            ResolveError::InvalidRequest(msg) | ResolveError::NotFound(msg) => msg,
            ResolveError::Internal(_) => "Internal Server Error",
        }
    }
}

pub(crate) const BAD_DOMAIN_PARAM: &str = "bad or missing domain query param";
pub(crate) const DOMAIN_NOT_SERVED: &str = "handles are not provided on this domain";
pub(crate) const HANDLE_NOT_FOUND: &str = "handle not found for this domain";
pub(crate) const MISSING_RESOURCE: &str = "missing resource parameter";
pub(crate) const INVALID_RESOURCE: &str = "invalid resource format, expected acct: URI";
pub(crate) const WEBFINGER_NOT_CONFIGURED: &str = "webfinger not configured";
pub(crate) const ACCOUNT_NOT_FOUND: &str = "account not found";
