//! `acct:` resource identifier parsing.
//!
//! Accepts `acct:<handle>@<host>` and the bare-domain form `acct:<handle>`.
//! The parser borrows from its input and rejects anything it cannot read
//! unambiguously.

use thiserror::Error;

const ACCT_SCHEME: &str = "acct:";

/// A parsed `acct:` URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcctUri<'a> {
    /// The handle to look up.
    pub handle: &'a str,
    /// The `@host` part, if present. Informational only.
    pub host: Option<&'a str>,
}

/// Why a resource string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("resource does not use the acct: scheme")]
    Scheme,

    #[error("acct: resource has no payload")]
    Empty,

    #[error("acct: resource contains a line break")]
    LineBreak,

    #[error("acct: resource has an empty handle")]
    EmptyHandle,
}

/// Parse an `acct:` resource into its handle and optional host.
pub fn parse_acct(resource: &str) -> Result<AcctUri<'_>, ResourceError> {
    let payload = resource
        .strip_prefix(ACCT_SCHEME)
        .ok_or(ResourceError::Scheme)?;

    if payload.is_empty() {
        return Err(ResourceError::Empty);
    }
    // Line terminators never belong to a handle.
    if payload.contains(['\n', '\r', '\u{2028}', '\u{2029}']) {
        return Err(ResourceError::LineBreak);
    }

    let (handle, host) = match payload.split_once('@') {
        Some((handle, host)) => (handle, Some(host)),
        None => (payload, None),
    };

    if handle.is_empty() {
        return Err(ResourceError::EmptyHandle);
    }

    Ok(AcctUri { handle, host })
}
