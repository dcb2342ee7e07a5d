//! Visitor access service.
//!
//! Runs the access state machine (request, authorize, cancel, check-in,
//! check-out) against a site under its lock.

use chrono::Utc;

use super::transition;
use crate::{
    error::AppError,
    lifecycle::LifecyclePolicy,
    models::{
        RecordFields,
        visitor::{VisitorExit, VisitorRecord},
    },
    store::SiteStore,
};

/// Record a visitor's access request. Returns the pending visitor.
pub async fn request_access(
    store: &dyn SiteStore,
    policy: &LifecyclePolicy,
    site_id: &str,
    fields: RecordFields,
) -> Result<VisitorRecord, AppError> {
    let visitor = transition(store, site_id, |site| {
        site.request_access(fields, policy, Utc::now())
    })
    .await?;

    tracing::info!(site_id, visitor_id = %visitor.id, "visitor access requested");
    Ok(visitor)
}

pub async fn authorize_access(store: &dyn SiteStore, site_id: &str) -> Result<(), AppError> {
    let authorized = transition(store, site_id, |site| {
        site.authorize_access();
        Ok(site.access_authorized())
    })
    .await?;

    if authorized {
        tracing::info!(site_id, "visitor access authorized");
    } else {
        tracing::warn!(site_id, "access authorization ignored: no pending visitor");
    }
    Ok(())
}

pub async fn cancel_access(store: &dyn SiteStore, site_id: &str) -> Result<(), AppError> {
    transition(store, site_id, |site| {
        site.cancel_access();
        Ok(())
    })
    .await?;

    tracing::info!(site_id, "visitor access request cancelled");
    Ok(())
}

/// Admit the pending visitor. Returns the visitor now on site.
///
/// # Errors
///
/// - `NoPendingVisitor` (404) when nothing was requested
/// - `AccessNotAuthorized` (403) in enforced mode without authorization
/// - `VisitorOnSite` (409) while a previous visitor has not checked out
pub async fn check_in(
    store: &dyn SiteStore,
    policy: &LifecyclePolicy,
    site_id: &str,
) -> Result<VisitorRecord, AppError> {
    let visitor = transition(store, site_id, |site| site.check_in(policy)).await?;

    tracing::info!(site_id, visitor_id = %visitor.id, "visitor checked in");
    Ok(visitor)
}

/// Log the current visitor out and archive the visit.
///
/// # Errors
///
/// - `NoCurrentVisitor` (404) when nobody is checked in
pub async fn check_out(
    store: &dyn SiteStore,
    policy: &LifecyclePolicy,
    site_id: &str,
    exit: VisitorExit,
) -> Result<VisitorRecord, AppError> {
    let visitor = transition(store, site_id, |site| {
        site.check_out(exit, policy, Utc::now())
    })
    .await?;

    tracing::info!(
        site_id,
        visitor_id = %visitor.id,
        officer = visitor.logged_out_by.as_deref().unwrap_or("unknown"),
        "visitor checked out"
    );
    Ok(visitor)
}
