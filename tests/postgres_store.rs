//! Tests for the Postgres site store.
//!
//! These need a live database and are skipped when `DATABASE_URL` is not set:
//!
//!   DATABASE_URL=postgres://... cargo test --test postgres_store
//!
//! Every test registers its own uniquely named sites, so runs do not
//! interfere with each other or with existing rows.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use site_custody_server::{
    db,
    error::AppError,
    lifecycle::{LifecycleError, LifecyclePolicy},
    models::{key_log::KeyStatus, site::SiteDetails, visitor::VisitorExit},
    store::{SiteStore, postgres::PgSiteStore},
};

async fn test_store() -> Option<PgSiteStore> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return None;
    };

    let pool = db::create_pool(&database_url, 10, Duration::from_secs(30))
        .await
        .expect("Failed to create test pool");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(PgSiteStore::new(pool))
}

fn details(name: &str) -> SiteDetails {
    serde_json::from_value(json!({ "name": name })).unwrap()
}

fn unique_id() -> String {
    format!("PG-{}", Uuid::new_v4().simple())
}

async fn site_with_visitor_on_site(store: &PgSiteStore) -> String {
    let site_id = unique_id();
    store.insert_site(&site_id, details("Tower")).await.unwrap();

    let policy = LifecyclePolicy::default();
    let mut lease = store.lock_site(&site_id).await.unwrap();
    lease
        .lifecycle()
        .request_access(
            serde_json::from_value(json!({ "name": "Alice" })).unwrap(),
            &policy,
            Utc::now(),
        )
        .unwrap();
    lease.lifecycle().check_in(&policy).unwrap();
    lease.commit().await.unwrap();

    site_id
}

#[tokio::test]
async fn visit_round_trips_through_leases() {
    let Some(store) = test_store().await else {
        return;
    };
    let policy = LifecyclePolicy::default();
    let site_id = unique_id();
    store.insert_site(&site_id, details("Tower")).await.unwrap();

    let mut lease = store.lock_site(&site_id).await.unwrap();
    let requested = lease
        .lifecycle()
        .request_access(
            serde_json::from_value(json!({ "name": "Alice", "company": "Acme" })).unwrap(),
            &policy,
            Utc::now(),
        )
        .unwrap();
    lease.lifecycle().authorize_access();
    lease.commit().await.unwrap();

    let site = store.get_site(&site_id).await.unwrap().unwrap();
    assert_eq!(site.lifecycle.pending_visitor(), Some(&requested));
    assert!(site.lifecycle.access_authorized());

    let mut lease = store.lock_site(&site_id).await.unwrap();
    let admitted = lease.lifecycle().check_in(&policy).unwrap();
    lease.commit().await.unwrap();

    let site = store.get_site(&site_id).await.unwrap().unwrap();
    assert!(site.lifecycle.pending_visitor().is_none());
    assert_eq!(site.lifecycle.current_visitor(), Some(&admitted));

    let mut lease = store.lock_site(&site_id).await.unwrap();
    lease
        .lifecycle()
        .check_out(
            VisitorExit {
                exit_photo: Some("exit.jpg".to_string()),
                officer_name: Some("Officer Bob".to_string()),
                officer_time: None,
            },
            &policy,
            Utc::now(),
        )
        .unwrap();
    lease.commit().await.unwrap();

    let site = store.get_site(&site_id).await.unwrap().unwrap();
    assert!(site.lifecycle.current_visitor().is_none());
    assert_eq!(site.lifecycle.visitor_history().len(), 1);

    let archived = site.lifecycle.visitor_history().latest().unwrap();
    assert_eq!(archived.id, admitted.id);
    assert_eq!(archived.exit_photo.as_deref(), Some("exit.jpg"));
    assert_eq!(archived.logged_out_by.as_deref(), Some("Officer Bob"));
    assert_eq!(archived.details["company"], "Acme");
}

#[tokio::test]
async fn key_status_follows_the_loan() {
    let Some(store) = test_store().await else {
        return;
    };
    let policy = LifecyclePolicy::default();
    let site_id = unique_id();
    store.insert_site(&site_id, details("Tower")).await.unwrap();

    let mut lease = store.lock_site(&site_id).await.unwrap();
    lease
        .lifecycle()
        .request_key(Default::default(), &policy, Utc::now())
        .unwrap();
    lease.lifecycle().confirm_borrow(&policy).unwrap();
    lease.commit().await.unwrap();

    let site = store.get_site(&site_id).await.unwrap().unwrap();
    assert_eq!(site.lifecycle.key_status(), KeyStatus::Borrowed);

    let mut lease = store.lock_site(&site_id).await.unwrap();
    lease
        .lifecycle()
        .return_key(Some("box.jpg".to_string()), &policy, Utc::now())
        .unwrap();
    lease.commit().await.unwrap();

    let site = store.get_site(&site_id).await.unwrap().unwrap();
    assert_eq!(site.lifecycle.key_status(), KeyStatus::Available);
    assert_eq!(site.lifecycle.key_history().len(), 1);
}

#[tokio::test]
async fn dropped_lease_rolls_back() {
    let Some(store) = test_store().await else {
        return;
    };
    let site_id = unique_id();
    store.insert_site(&site_id, details("Tower")).await.unwrap();

    {
        let mut lease = store.lock_site(&site_id).await.unwrap();
        lease
            .lifecycle()
            .request_access(Default::default(), &LifecyclePolicy::default(), Utc::now())
            .unwrap();
    }

    let site = store.get_site(&site_id).await.unwrap().unwrap();
    assert!(site.lifecycle.pending_visitor().is_none());

    // The row lock was released with the transaction.
    let relock = tokio::time::timeout(Duration::from_secs(5), store.lock_site(&site_id)).await;
    assert!(relock.is_ok());
}

#[tokio::test]
async fn row_lock_serializes_concurrent_checkouts() {
    let Some(store) = test_store().await else {
        return;
    };
    let store = Arc::new(store);
    let site_id = site_with_visitor_on_site(&store).await;

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let store = store.clone();
            let site_id = site_id.clone();
            tokio::spawn(async move {
                let mut lease = store.lock_site(&site_id).await?;
                let exit = VisitorExit {
                    exit_photo: Some(format!("exit-{n}.jpg")),
                    ..VisitorExit::default()
                };
                lease
                    .lifecycle()
                    .check_out(exit, &LifecyclePolicy::default(), Utc::now())?;
                lease.commit().await
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().filter(|r| r.is_err()).all(|r| matches!(
        r,
        Err(AppError::Lifecycle(LifecycleError::NoCurrentVisitor))
    )));

    let site = store.get_site(&site_id).await.unwrap().unwrap();
    assert!(site.lifecycle.current_visitor().is_none());
    assert_eq!(site.lifecycle.visitor_history().len(), 1);
}

#[tokio::test]
async fn list_sites_orders_by_name() {
    let Some(store) = test_store().await else {
        return;
    };
    let tag = Uuid::new_v4().simple().to_string();
    let ids = [unique_id(), unique_id(), unique_id()];
    for (id, name) in ids.iter().zip(["Zulu", "Alpha", "Mike"]) {
        store
            .insert_site(id, details(&format!("{tag} {name}")))
            .await
            .unwrap();
    }

    let names: Vec<_> = store
        .list_sites()
        .await
        .unwrap()
        .into_iter()
        .filter(|site| ids.contains(&site.id))
        .map(|site| site.details.name)
        .collect();

    assert_eq!(
        names,
        vec![
            format!("{tag} Alpha"),
            format!("{tag} Mike"),
            format!("{tag} Zulu"),
        ]
    );
}

#[tokio::test]
async fn duplicate_site_id_conflicts() {
    let Some(store) = test_store().await else {
        return;
    };
    let site_id = unique_id();
    store.insert_site(&site_id, details("Tower")).await.unwrap();

    let result = store.insert_site(&site_id, details("Again")).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn stray_authorization_flags_are_masked() {
    let Some(store) = test_store().await else {
        return;
    };
    let site_id = unique_id();
    store.insert_site(&site_id, details("Tower")).await.unwrap();

    let database_url = std::env::var("DATABASE_URL").unwrap();
    let pool = db::create_pool(&database_url, 1, Duration::from_secs(30))
        .await
        .unwrap();
    sqlx::query(
        "UPDATE sites SET access_authorized = TRUE, key_access_authorized = TRUE WHERE id = $1",
    )
    .bind(&site_id)
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;

    let site = store.get_site(&site_id).await.unwrap().unwrap();
    assert!(!site.lifecycle.access_authorized());
    assert!(!site.lifecycle.key_access_authorized());
}
