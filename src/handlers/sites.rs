//! Site registry HTTP handlers.
//!
//! This module implements the site endpoints:
//! - GET /api/sites - List all sites (sorted by name)
//! - GET /api/sites/{id} - Get one site
//! - POST /api/sites - Register a site
//! - PUT /api/sites/{id} - Edit a site's static metadata

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::ApiJson;
use crate::{
    AppState,
    error::AppError,
    models::site::{CreateSiteRequest, SiteDetails, SiteResponse, validate_site_id},
};

/// List every site with its full lifecycle snapshot.
///
/// # Response
///
/// - **Success (200 OK)**: array of sites ordered by name (may be empty)
/// - **Error (503)**: storage unavailable. Never answered with an empty list.
pub async fn list_sites(
    State(state): State<AppState>,
) -> Result<Json<Vec<SiteResponse>>, AppError> {
    let sites = state.store.list_sites().await?;

    Ok(Json(sites.into_iter().map(Into::into).collect()))
}

pub async fn get_site(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<SiteResponse>, AppError> {
    let site = state
        .store
        .get_site(validate_site_id(&site_id)?)
        .await?
        .ok_or(AppError::SiteNotFound)?;

    Ok(Json(site.into()))
}

/// Register a new site.
///
/// # Request Body
///
/// ```json
/// {
///   "id": "TWR-001",
///   "name": "Hilltop Tower",
///   "type": "Outdoor",
///   "caretaker": "Juan"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the new site, idle with empty histories
/// - **Error (400)**: missing id or name
/// - **Error (409)**: id already registered
pub async fn create_site(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateSiteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (site_id, details) = request.into_parts()?;

    let site = state.store.insert_site(&site_id, details).await?;
    tracing::info!(site_id = %site.id, name = %site.details.name, "site registered");

    Ok((StatusCode::CREATED, Json(SiteResponse::from(site))))
}

/// Replace a site's static metadata.
///
/// Lifecycle fields in the body are ignored; visitor and key state can
/// only change through the access and key endpoints.
pub async fn update_site(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    ApiJson(details): ApiJson<SiteDetails>,
) -> Result<Json<SiteResponse>, AppError> {
    let site_id = validate_site_id(&site_id)?;
    details.validate()?;

    let site = state.store.update_site_details(site_id, details).await?;
    tracing::info!(site_id, "site details updated");

    Ok(Json(site.into()))
}
