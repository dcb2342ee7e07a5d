//! Site persistence.
//!
//! The server talks to storage only through [`SiteStore`], injected into
//! handlers as `Arc<dyn SiteStore>`. Two implementations exist:
//!
//! - [`postgres::PgSiteStore`]: durable, one row per site, JSONB lifecycle columns
//! - [`memory::MemorySiteStore`]: process-local, used when no database is configured
//!
//! # Per-site exclusion
//!
//! Lifecycle transitions go through [`SiteStore::lock_site`], which returns a
//! [`SiteLease`] holding an exclusive lock on that one site. Two concurrent
//! checkouts of the same site are serialized: the second one sees the
//! visitor already archived and fails instead of archiving it twice.
//! Dropping a lease without calling [`SiteLease::commit`] discards every
//! change made through it.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    lifecycle::SiteLifecycle,
    models::site::{Site, SiteDetails},
};

/// Exclusive, uncommitted view of one site's lifecycle state.
#[async_trait]
pub trait SiteLease: Send {
    /// Lifecycle state as loaded under the lock.
    fn lifecycle(&mut self) -> &mut SiteLifecycle;

    /// Persist the lifecycle state and release the lock.
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait]
pub trait SiteStore: Send + Sync {
    /// Round-trip to the backing storage.
    async fn ping(&self) -> Result<(), AppError>;

    /// All sites, sorted by name ascending.
    async fn list_sites(&self) -> Result<Vec<Site>, AppError>;

    async fn get_site(&self, site_id: &str) -> Result<Option<Site>, AppError>;

    /// Register a new site. Its lifecycle starts idle with empty ledgers.
    ///
    /// Fails with `Conflict` if the id is taken.
    async fn insert_site(&self, site_id: &str, details: SiteDetails) -> Result<Site, AppError>;

    /// Replace a site's static metadata. Lifecycle state is untouched.
    async fn update_site_details(
        &self,
        site_id: &str,
        details: SiteDetails,
    ) -> Result<Site, AppError>;

    /// Lock one site for a lifecycle transition.
    ///
    /// Waits while another lease on the same site is outstanding. Fails with
    /// `SiteNotFound` if the site does not exist.
    async fn lock_site(&self, site_id: &str) -> Result<Box<dyn SiteLease>, AppError>;

    /// Release storage resources at shutdown.
    async fn close(&self) {}
}
