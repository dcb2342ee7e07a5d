//! Key custody HTTP handlers.
//!
//! - POST /api/keys/request - Ask to borrow a site's key
//! - POST /api/keys/authorize/{site_id} - Approve the pending request
//! - POST /api/keys/cancel/{site_id} - Drop the pending request
//! - POST /api/keys/confirm/{site_id} - Hand the key over
//! - POST /api/keys/return/{site_id} - Take the key back

use axum::{
    Json,
    extract::{Path, State},
};

use super::ApiJson;
use crate::{
    AppState,
    error::AppError,
    models::{
        SiteScopedRequest, SuccessResponse,
        key_log::{CurrentKeyLogResponse, PendingKeyLogResponse, ReturnKeyRequest},
        site::validate_site_id,
    },
    services::key_service,
};

/// Request a site's key.
///
/// # Request Body
///
/// ```json
/// {
///   "siteId": "TWR-001",
///   "borrower": "Dan",
///   "purpose": "Generator refuel"
/// }
/// ```
pub async fn request_key(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SiteScopedRequest>,
) -> Result<Json<PendingKeyLogResponse>, AppError> {
    let (site_id, fields) = request.into_parts()?;

    let pending_key_log =
        key_service::request_key(state.store.as_ref(), &state.policy, &site_id, fields).await?;

    Ok(Json(PendingKeyLogResponse {
        success: true,
        pending_key_log,
    }))
}

pub async fn authorize_key(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let site_id = validate_site_id(&site_id)?;
    key_service::authorize_key(state.store.as_ref(), site_id).await?;

    Ok(Json(SuccessResponse::ok()))
}

pub async fn cancel_key(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let site_id = validate_site_id(&site_id)?;
    key_service::cancel_key(state.store.as_ref(), site_id).await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Confirm the key was handed over.
///
/// # Response
///
/// - **Success (200 OK)**: the current key log, id `KEY-…`
/// - **Error (404)**: no pending key request
/// - **Error (403)**: not authorized (enforced mode only)
/// - **Error (409)**: the key is already out
pub async fn confirm_borrow(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<CurrentKeyLogResponse>, AppError> {
    let site_id = validate_site_id(&site_id)?;

    let current_key_log =
        key_service::confirm_borrow(state.store.as_ref(), &state.policy, site_id).await?;

    Ok(Json(CurrentKeyLogResponse {
        success: true,
        current_key_log,
    }))
}

/// Record the key's return.
///
/// # Request Body
///
/// ```json
/// { "returnPhoto": "data:image/jpeg;base64,..." }
/// ```
///
/// The body is optional.
pub async fn return_key(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    body: Option<ApiJson<ReturnKeyRequest>>,
) -> Result<Json<SuccessResponse>, AppError> {
    let site_id = validate_site_id(&site_id)?;
    let request = body.map(|ApiJson(request)| request).unwrap_or_default();

    key_service::return_key(
        state.store.as_ref(),
        &state.policy,
        site_id,
        request.return_photo,
    )
    .await?;

    Ok(Json(SuccessResponse::ok()))
}
