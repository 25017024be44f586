//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and how core
//! errors are reported over HTTP.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use issuezz_core::ports::PortError;
use serde::Serialize;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

/// An error as returned by a web handler: a status plus a `{detail}` body.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub detail: String,
}

impl HttpError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

pub fn status_for(error: &PortError) -> StatusCode {
    match error {
        PortError::InvalidInput(_) | PortError::InvalidRepoUrl(_) => StatusCode::BAD_REQUEST,
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        PortError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        PortError::Malformed(_) | PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PortError> for HttpError {
    fn from(error: PortError) -> Self {
        Self::new(status_for(&error), error.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_port_errors_to_statuses() {
        assert_eq!(
            status_for(&PortError::InvalidRepoUrl("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&PortError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&PortError::RateLimited("x".into())),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_for(&PortError::Upstream {
                status: 503,
                message: "down".into()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&PortError::Malformed("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
