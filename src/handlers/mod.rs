//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params)
//! 2. Calls into the store or a lifecycle service
//! 3. Returns HTTP response (JSON, status code)

use axum::{
    extract::{FromRequest, OptionalFromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Visitor access endpoints
pub mod access;
/// Service health endpoint
pub mod health;
/// Key custody endpoints
pub mod keys;
/// Site registry endpoints
pub mod sites;

/// JSON body extractor whose rejections use the application error format.
///
/// Behaves like `axum::Json` but a malformed or incomplete body becomes
/// `AppError::Validation` (or `PayloadTooLarge` above the body limit)
/// instead of axum's plain-text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Option<ApiJson<T>>` is `None` when the request carries no
/// `Content-Type` at all. A body that is present but malformed is still
/// rejected.
impl<T, S> OptionalFromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let body =
            <axum::Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?;
        Ok(body.map(|axum::Json(value)| ApiJson(value)))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(rejection.body_text()),
            _ => AppError::Validation(rejection.body_text()),
        }
    }
}
