//! Business logic services.
//!
//! Services run lifecycle transitions against storage, separated from HTTP
//! handlers. Each call locks one site, applies one transition, and commits
//! only if the transition succeeded.

pub mod access_service;
pub mod key_service;

use crate::{
    error::AppError,
    lifecycle::{LifecycleError, SiteLifecycle},
    store::SiteStore,
};

/// Apply `apply` to a site's lifecycle under its lock.
///
/// # Process
///
/// 1. Lock the site (waits for any in-flight transition on it)
/// 2. Apply the transition to the locked state
/// 3. Commit on success; on failure drop the lease, discarding changes
///
/// # Errors
///
/// - `SiteNotFound`: no such site
/// - `Lifecycle`: the transition was rejected, nothing was written
/// - `Database`: storage failed
async fn transition<T>(
    store: &dyn SiteStore,
    site_id: &str,
    apply: impl FnOnce(&mut SiteLifecycle) -> Result<T, LifecycleError>,
) -> Result<T, AppError> {
    let mut lease = store.lock_site(site_id).await?;

    let outcome = apply(lease.lifecycle()).inspect_err(|err| {
        tracing::debug!(site_id, error = %err, "transition rejected");
    })?;

    lease.commit().await?;
    Ok(outcome)
}
