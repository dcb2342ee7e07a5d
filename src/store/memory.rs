//! In-process site store.
//!
//! Used when `DATABASE_URL` is not set and by the test suite. State does not
//! survive a restart.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::{SiteLease, SiteStore};
use crate::{
    error::AppError,
    lifecycle::SiteLifecycle,
    models::site::{Site, SiteDetails},
};

/// Sites keyed by id, each behind its own mutex.
#[derive(Debug, Default)]
pub struct MemorySiteStore {
    sites: RwLock<HashMap<String, Arc<Mutex<Site>>>>,
}

impl MemorySiteStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, site_id: &str) -> Option<Arc<Mutex<Site>>> {
        self.sites.read().await.get(site_id).cloned()
    }
}

#[async_trait]
impl SiteStore for MemorySiteStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_sites(&self) -> Result<Vec<Site>, AppError> {
        let entries: Vec<_> = self.sites.read().await.values().cloned().collect();

        let mut sites = Vec::with_capacity(entries.len());
        for entry in entries {
            sites.push(entry.lock().await.clone());
        }
        sites.sort_by(|a, b| {
            a.details
                .name
                .cmp(&b.details.name)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(sites)
    }

    async fn get_site(&self, site_id: &str) -> Result<Option<Site>, AppError> {
        match self.entry(site_id).await {
            Some(entry) => Ok(Some(entry.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn insert_site(&self, site_id: &str, details: SiteDetails) -> Result<Site, AppError> {
        let mut sites = self.sites.write().await;
        if sites.contains_key(site_id) {
            return Err(AppError::Conflict(format!("Site {site_id} already exists")));
        }

        let site = Site {
            id: site_id.to_string(),
            details,
            lifecycle: SiteLifecycle::default(),
        };
        sites.insert(site_id.to_string(), Arc::new(Mutex::new(site.clone())));

        Ok(site)
    }

    async fn update_site_details(
        &self,
        site_id: &str,
        details: SiteDetails,
    ) -> Result<Site, AppError> {
        let entry = self.entry(site_id).await.ok_or(AppError::SiteNotFound)?;
        let mut site = entry.lock().await;
        site.details = details;
        Ok(site.clone())
    }

    async fn lock_site(&self, site_id: &str) -> Result<Box<dyn SiteLease>, AppError> {
        let entry = self.entry(site_id).await.ok_or(AppError::SiteNotFound)?;
        let guard = entry.lock_owned().await;
        let working = guard.lifecycle.clone();

        Ok(Box::new(MemoryLease { guard, working }))
    }
}

/// Holds the site's mutex; changes go to `working` until commit.
struct MemoryLease {
    guard: OwnedMutexGuard<Site>,
    working: SiteLifecycle,
}

#[async_trait]
impl SiteLease for MemoryLease {
    fn lifecycle(&mut self) -> &mut SiteLifecycle {
        &mut self.working
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryLease { mut guard, working } = *self;
        guard.lifecycle = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecyclePolicy;
    use chrono::Utc;
    use std::time::Duration;

    fn details(name: &str) -> SiteDetails {
        serde_json::from_value(serde_json::json!({ "name": name })).unwrap()
    }

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let store = MemorySiteStore::new();
        store.insert_site("S2", details("Zulu Tower")).await.unwrap();
        store.insert_site("S1", details("Alpha Tower")).await.unwrap();
        store.insert_site("S3", details("Mike Tower")).await.unwrap();

        let names: Vec<_> = store
            .list_sites()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.details.name)
            .collect();
        assert_eq!(names, vec!["Alpha Tower", "Mike Tower", "Zulu Tower"]);
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts() {
        let store = MemorySiteStore::new();
        store.insert_site("S1", details("Tower")).await.unwrap();

        let result = store.insert_site("S1", details("Other")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn uncommitted_lease_changes_are_discarded() {
        let store = MemorySiteStore::new();
        store.insert_site("S1", details("Tower")).await.unwrap();

        {
            let mut lease = store.lock_site("S1").await.unwrap();
            lease
                .lifecycle()
                .request_access(Default::default(), &LifecyclePolicy::default(), Utc::now())
                .unwrap();
        }

        let site = store.get_site("S1").await.unwrap().unwrap();
        assert!(site.lifecycle.pending_visitor().is_none());
    }

    #[tokio::test]
    async fn committed_lease_changes_persist() {
        let store = MemorySiteStore::new();
        store.insert_site("S1", details("Tower")).await.unwrap();

        let mut lease = store.lock_site("S1").await.unwrap();
        lease
            .lifecycle()
            .request_key(Default::default(), &LifecyclePolicy::default(), Utc::now())
            .unwrap();
        lease.commit().await.unwrap();

        let site = store.get_site("S1").await.unwrap().unwrap();
        assert!(site.lifecycle.pending_key_log().is_some());
    }

    #[tokio::test]
    async fn lease_excludes_concurrent_lock_on_same_site() {
        let store = Arc::new(MemorySiteStore::new());
        store.insert_site("S1", details("Tower")).await.unwrap();
        store.insert_site("S2", details("Other")).await.unwrap();

        let lease = store.lock_site("S1").await.unwrap();

        // Other sites are not blocked.
        let other = tokio::time::timeout(Duration::from_millis(100), store.lock_site("S2")).await;
        assert!(other.is_ok());

        let same = tokio::time::timeout(Duration::from_millis(100), store.lock_site("S1")).await;
        assert!(same.is_err(), "second lease on S1 must wait");

        drop(lease);
        let same = tokio::time::timeout(Duration::from_millis(100), store.lock_site("S1")).await;
        assert!(same.is_ok());
    }

    #[tokio::test]
    async fn details_update_keeps_lifecycle() {
        let store = MemorySiteStore::new();
        store.insert_site("S1", details("Tower")).await.unwrap();

        let mut lease = store.lock_site("S1").await.unwrap();
        lease
            .lifecycle()
            .request_access(Default::default(), &LifecyclePolicy::default(), Utc::now())
            .unwrap();
        lease.commit().await.unwrap();

        let site = store.update_site_details("S1", details("Renamed")).await.unwrap();
        assert_eq!(site.details.name, "Renamed");
        assert!(site.lifecycle.pending_visitor().is_some());
    }

    #[tokio::test]
    async fn unknown_site_is_not_found() {
        let store = MemorySiteStore::new();

        assert!(matches!(store.lock_site("nope").await, Err(AppError::SiteNotFound)));
        assert!(matches!(
            store.update_site_details("nope", details("x")).await,
            Err(AppError::SiteNotFound)
        ));
        assert!(store.get_site("nope").await.unwrap().is_none());
    }
}
