//! Visitor access HTTP handlers.
//!
//! This module implements the visitor lifecycle endpoints:
//! - POST /api/access/request - Register a visitor awaiting authorization
//! - POST /api/access/authorize/{site_id} - Open the check-in gate
//! - POST /api/access/cancel/{site_id} - Drop the pending request
//! - POST /api/access/checkin/{site_id} - Admit the pending visitor
//! - POST /api/access/checkout/{site_id} - Log the visitor out and archive the visit

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
        site::validate_site_id,
        visitor::{CheckOutRequest, CurrentVisitorResponse, PendingVisitorResponse},
    },
    services::access_service,
};

/// Request access for a visitor.
///
/// # Request Body
///
/// ```json
/// {
///   "siteId": "TWR-001",
///   "name": "Alice",
///   "company": "Acme Towers"
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: the pending visitor, id `REQ-…`
/// - **Error (400)**: missing `siteId`
/// - **Error (404)**: unknown site
/// - **Error (409)**: a request is already pending (reject mode only)
pub async fn request_access(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SiteScopedRequest>,
) -> Result<Json<PendingVisitorResponse>, AppError> {
    let (site_id, fields) = request.into_parts()?;

    let pending_visitor =
        access_service::request_access(state.store.as_ref(), &state.policy, &site_id, fields)
            .await?;

    Ok(Json(PendingVisitorResponse {
        success: true,
        pending_visitor,
    }))
}

/// Authorize the pending visitor's check-in.
///
/// Always succeeds for an existing site.
pub async fn authorize_access(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let site_id = validate_site_id(&site_id)?;
    access_service::authorize_access(state.store.as_ref(), site_id).await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Cancel the pending request. Idempotent.
pub async fn cancel_access(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let site_id = validate_site_id(&site_id)?;
    access_service::cancel_access(state.store.as_ref(), site_id).await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Check the pending visitor in.
///
/// # Response
///
/// - **Success (200 OK)**: the visitor now on site, id `VIS-…`
/// - **Error (404)**: no pending visitor
/// - **Error (403)**: not authorized (enforced mode only)
/// - **Error (409)**: another visitor is still checked in
pub async fn check_in(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<CurrentVisitorResponse>, AppError> {
    let site_id = validate_site_id(&site_id)?;

    let current_visitor =
        access_service::check_in(state.store.as_ref(), &state.policy, site_id).await?;

    Ok(Json(CurrentVisitorResponse {
        success: true,
        current_visitor,
    }))
}

/// Check the current visitor out.
///
/// # Request Body
///
/// ```json
/// {
///   "exitPhoto": "data:image/jpeg;base64,...",
///   "name": "Officer Bob",
///   "time": "17:05"
/// }
/// ```
///
/// The body is optional; without it the visit is archived with no exit
/// details.
///
/// # Response
///
/// - **Success (200 OK)**: `{ "success": true }`
/// - **Error (404)**: nobody is checked in
pub async fn check_out(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    body: Option<ApiJson<CheckOutRequest>>,
) -> Result<Json<SuccessResponse>, AppError> {
    let site_id = validate_site_id(&site_id)?;
    let request = body.map(|ApiJson(request)| request).unwrap_or_default();

    access_service::check_out(
        state.store.as_ref(),
        &state.policy,
        site_id,
        request.into(),
    )
    .await?;

    Ok(Json(SuccessResponse::ok()))
}
