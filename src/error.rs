//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::lifecycle::LifecycleError;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Storage Errors**: the site store could not be reached or failed
/// - **Resource Errors**: the addressed site does not exist
/// - **Lifecycle Errors**: a transition cannot proceed from the site's state
/// - **Validation Errors**: malformed or missing identifiers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Storage failed (connection refused, pool timeout, query error).
    ///
    /// Always reported as its own error so an outage is never mistaken for
    /// an empty result. Returns HTTP 503.
    #[error("Storage unavailable: {0}")]
    Database(#[from] sqlx::Error),

    /// No site with the requested id.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Site not found")]
    SiteNotFound,

    /// Transition rejected by the state machine.
    ///
    /// Missing pending/current records map to 404, a closed authorization
    /// gate to 403, and everything else to 409.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Request body exceeds the configured limit.
    ///
    /// Returns HTTP 413 Payload Too Large.
    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    /// Resource already exists.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable"),
            AppError::SiteNotFound => (StatusCode::NOT_FOUND, "site_not_found"),
            AppError::Lifecycle(err) if err.is_not_found() => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Lifecycle(err) if err.is_unauthorized() => {
                (StatusCode::FORBIDDEN, "authorization_required")
            }
            AppError::Lifecycle(_) => (StatusCode::CONFLICT, "invalid_state"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "No visitor is checked in at this site"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(err) => {
                tracing::error!(error = %err, "storage error");
                // Hide driver details from clients
                "Storage is unavailable, please retry".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failure_is_service_unavailable() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(
            err.status_and_code(),
            (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
        );
    }

    #[test]
    fn missing_records_are_not_found() {
        for err in [
            LifecycleError::NoPendingVisitor,
            LifecycleError::NoCurrentVisitor,
            LifecycleError::NoPendingKeyRequest,
            LifecycleError::NoBorrowedKey,
        ] {
            let (status, code) = AppError::from(err).status_and_code();
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(code, "not_found");
        }
    }

    #[test]
    fn closed_gate_is_forbidden() {
        let (status, _) = AppError::from(LifecycleError::AccessNotAuthorized).status_and_code();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn state_conflicts_are_conflict() {
        for err in [
            LifecycleError::AccessRequestPending,
            LifecycleError::VisitorOnSite,
            LifecycleError::KeyAlreadyBorrowed,
        ] {
            let (status, _) = AppError::from(err).status_and_code();
            assert_eq!(status, StatusCode::CONFLICT);
        }
    }

    #[test]
    fn oversized_body_is_payload_too_large() {
        let (status, code) = AppError::PayloadTooLarge("limit".into()).status_and_code();
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(code, "payload_too_large");
    }

    #[test]
    fn validation_is_bad_request() {
        let (status, code) = AppError::Validation("siteId is required".into()).status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "validation_failed");
    }
}
