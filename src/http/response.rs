//! Response bodies and error rendering.
//!
//! # Responsibilities
//! - Map `ResolveError` kinds to HTTP status codes
//! - Render the two error shapes: `{error, message}` and discovery `{error}`
//! - Log internal failures; never serialize their cause
//!
//! # Design Decisions
//! - 400 for InvalidRequest, 404 for NotFound, 500 for everything else
//! - JRD documents are served as `application/jrd+json`

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::resolver::{ResolveError, WebfingerDocument};

/// Content type of WebFinger responses.
pub const JRD_CONTENT_TYPE: &str = "application/jrd+json";

/// `{"success": true}`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Error body for the handle endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Error body for discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveryErrorResponse {
    pub error: String,
}

/// HTTP status for a resolution error.
pub fn status_for(err: &ResolveError) -> StatusCode {
    match err {
        ResolveError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        ResolveError::NotFound(_) => StatusCode::NOT_FOUND,
        ResolveError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn log_internal(err: &ResolveError) {
    if let ResolveError::Internal(cause) = err {
        tracing::error!(error = %cause, "Resolution failed");
    }
}

/// Error from `/tls-check` and `/check-handle`.
#[derive(Debug)]
pub struct ApiError(pub ResolveError);

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log_internal(&self.0);
        let body = ErrorResponse {
            error: self.0.kind().to_string(),
            message: self.0.public_message().to_string(),
        };
        (status_for(&self.0), Json(body)).into_response()
    }
}

/// Error from `/.well-known/webfinger`.
#[derive(Debug)]
pub struct DiscoveryError(pub ResolveError);

impl From<ResolveError> for DiscoveryError {
    fn from(err: ResolveError) -> Self {
        DiscoveryError(err)
    }
}

impl IntoResponse for DiscoveryError {
    fn into_response(self) -> Response {
        log_internal(&self.0);
        let error = match &self.0 {
            ResolveError::Internal(_) => "internal server error",
            other => other.public_message(),
        };
        let body = DiscoveryErrorResponse {
            error: error.to_string(),
        };
        (status_for(&self.0), Json(body)).into_response()
    }
}

/// A JRD document response.
#[derive(Debug)]
pub struct Jrd(pub WebfingerDocument);

impl IntoResponse for Jrd {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, HeaderValue::from_static(JRD_CONTENT_TYPE))],
            Json(self.0),
        )
            .into_response()
    }
}
