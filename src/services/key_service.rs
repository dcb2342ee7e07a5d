//! Key custody service.

use chrono::Utc;

use super::transition;
use crate::{
    error::AppError,
    lifecycle::LifecyclePolicy,
    models::{RecordFields, key_log::KeyLog},
    store::SiteStore,
};

/// Record a key request. Returns the pending key log.
pub async fn request_key(
    store: &dyn SiteStore,
    policy: &LifecyclePolicy,
    site_id: &str,
    fields: RecordFields,
) -> Result<KeyLog, AppError> {
    let log = transition(store, site_id, |site| {
        site.request_key(fields, policy, Utc::now())
    })
    .await?;

    tracing::info!(site_id, key_log_id = %log.id, "key requested");
    Ok(log)
}

pub async fn authorize_key(store: &dyn SiteStore, site_id: &str) -> Result<(), AppError> {
    let authorized = transition(store, site_id, |site| {
        site.authorize_key();
        Ok(site.key_access_authorized())
    })
    .await?;

    if authorized {
        tracing::info!(site_id, "key access authorized");
    } else {
        tracing::warn!(site_id, "key authorization ignored: no pending key request");
    }
    Ok(())
}

pub async fn cancel_key(store: &dyn SiteStore, site_id: &str) -> Result<(), AppError> {
    transition(store, site_id, |site| {
        site.cancel_key();
        Ok(())
    })
    .await?;

    tracing::info!(site_id, "key request cancelled");
    Ok(())
}

/// Hand over the key for the pending request. Returns the current loan.
pub async fn confirm_borrow(
    store: &dyn SiteStore,
    policy: &LifecyclePolicy,
    site_id: &str,
) -> Result<KeyLog, AppError> {
    let log = transition(store, site_id, |site| site.confirm_borrow(policy)).await?;

    tracing::info!(site_id, key_log_id = %log.id, "key borrowed");
    Ok(log)
}

/// Take the key back and archive the loan.
pub async fn return_key(
    store: &dyn SiteStore,
    policy: &LifecyclePolicy,
    site_id: &str,
    return_photo: Option<String>,
) -> Result<KeyLog, AppError> {
    let log = transition(store, site_id, |site| {
        site.return_key(return_photo, policy, Utc::now())
    })
    .await?;

    tracing::info!(site_id, key_log_id = %log.id, "key returned");
    Ok(log)
}
