//! PostgreSQL site store.
//!
//! One row per site in the `sites` table. Pending and current records are
//! nullable JSONB columns; the two ledgers are JSONB arrays (newest first).
//!
//! # Locking
//!
//! `lock_site` opens a transaction and takes a row lock with
//! `SELECT ... FOR UPDATE`. The lease's `commit` writes every lifecycle
//! column back in the same transaction. Dropping the lease rolls the
//! transaction back and releases the row.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Postgres, Transaction, types::Json};

use super::{SiteLease, SiteStore};
use crate::{
    db::DbPool,
    error::AppError,
    lifecycle::{SiteLifecycle, history::History},
    models::{
        key_log::KeyLog,
        site::{Site, SiteDetails},
        visitor::VisitorRecord,
    },
};

macro_rules! site_columns {
    () => {
        "id, name, type, address, gps_coordinates, caretaker, caretaker_contact, \
         last_maintenance_date, next_maintenance_date, asset_photo, \
         access_authorized, key_access_authorized, \
         pending_visitor, current_visitor, visitor_history, \
         pending_key_log, current_key_log, key_history"
    };
}

const LIST_SITES: &str = concat!(
    "SELECT ",
    site_columns!(),
    " FROM sites ORDER BY name ASC, id ASC"
);

const GET_SITE: &str = concat!("SELECT ", site_columns!(), " FROM sites WHERE id = $1");

const LOCK_SITE: &str = concat!(
    "SELECT ",
    site_columns!(),
    " FROM sites WHERE id = $1 FOR UPDATE"
);

const INSERT_SITE: &str = concat!(
    "INSERT INTO sites (id, name, type, address, gps_coordinates, caretaker, caretaker_contact, \
     last_maintenance_date, next_maintenance_date, asset_photo) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
     RETURNING ",
    site_columns!()
);

const UPDATE_DETAILS: &str = concat!(
    "UPDATE sites SET name = $1, type = $2, address = $3, gps_coordinates = $4, \
     caretaker = $5, caretaker_contact = $6, last_maintenance_date = $7, \
     next_maintenance_date = $8, asset_photo = $9 \
     WHERE id = $10 \
     RETURNING ",
    site_columns!()
);

const UPDATE_LIFECYCLE: &str = r#"
    UPDATE sites
    SET key_status = $1,
        access_authorized = $2,
        key_access_authorized = $3,
        pending_visitor = $4,
        current_visitor = $5,
        visitor_history = $6,
        pending_key_log = $7,
        current_key_log = $8,
        key_history = $9
    WHERE id = $10
"#;

/// Row shape of the `sites` table.
///
/// `key_status` is not read back: it is derived from `current_key_log`.
#[derive(Debug, sqlx::FromRow)]
struct SiteRow {
    id: String,
    name: String,
    #[sqlx(rename = "type")]
    site_type: String,
    address: Option<String>,
    gps_coordinates: Option<String>,
    caretaker: Option<String>,
    caretaker_contact: Option<String>,
    last_maintenance_date: Option<NaiveDate>,
    next_maintenance_date: Option<NaiveDate>,
    asset_photo: Option<String>,

    access_authorized: bool,
    key_access_authorized: bool,

    pending_visitor: Option<Json<VisitorRecord>>,
    current_visitor: Option<Json<VisitorRecord>>,
    visitor_history: Json<History<VisitorRecord>>,
    pending_key_log: Option<Json<KeyLog>>,
    current_key_log: Option<Json<KeyLog>>,
    key_history: Json<History<KeyLog>>,
}

impl From<SiteRow> for Site {
    fn from(row: SiteRow) -> Self {
        let pending_visitor = row.pending_visitor.map(|Json(v)| v);

        Site {
            id: row.id,
            details: SiteDetails {
                name: row.name,
                site_type: row.site_type,
                address: row.address,
                gps_coordinates: row.gps_coordinates,
                caretaker: row.caretaker,
                caretaker_contact: row.caretaker_contact,
                last_maintenance_date: row.last_maintenance_date,
                next_maintenance_date: row.next_maintenance_date,
                asset_photo: row.asset_photo,
            },
            lifecycle: SiteLifecycle {
                // Rows written before the gate was tied to a pending record
                // may carry a stray flag.
                access_authorized: row.access_authorized && pending_visitor.is_some(),
                key_access_authorized: row.key_access_authorized && row.pending_key_log.is_some(),
                pending_visitor,
                current_visitor: row.current_visitor.map(|Json(v)| v),
                visitor_history: row.visitor_history.0,
                pending_key_log: row.pending_key_log.map(|Json(k)| k),
                current_key_log: row.current_key_log.map(|Json(k)| k),
                key_history: row.key_history.0,
            },
        }
    }
}

/// Site store backed by the `sites` table.
#[derive(Debug, Clone)]
pub struct PgSiteStore {
    pool: DbPool,
}

impl PgSiteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SiteStore for PgSiteStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_sites(&self) -> Result<Vec<Site>, AppError> {
        let rows = sqlx::query_as::<_, SiteRow>(LIST_SITES)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Site::from).collect())
    }

    async fn get_site(&self, site_id: &str) -> Result<Option<Site>, AppError> {
        let row = sqlx::query_as::<_, SiteRow>(GET_SITE)
            .bind(site_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Site::from))
    }

    async fn insert_site(&self, site_id: &str, details: SiteDetails) -> Result<Site, AppError> {
        let row = sqlx::query_as::<_, SiteRow>(INSERT_SITE)
            .bind(site_id)
            .bind(&details.name)
            .bind(&details.site_type)
            .bind(&details.address)
            .bind(&details.gps_coordinates)
            .bind(&details.caretaker)
            .bind(&details.caretaker_contact)
            .bind(details.last_maintenance_date)
            .bind(details.next_maintenance_date)
            .bind(&details.asset_photo)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if err
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation())
                {
                    AppError::Conflict(format!("Site {site_id} already exists"))
                } else {
                    AppError::Database(err)
                }
            })?;

        Ok(row.into())
    }

    async fn update_site_details(
        &self,
        site_id: &str,
        details: SiteDetails,
    ) -> Result<Site, AppError> {
        let row = sqlx::query_as::<_, SiteRow>(UPDATE_DETAILS)
            .bind(&details.name)
            .bind(&details.site_type)
            .bind(&details.address)
            .bind(&details.gps_coordinates)
            .bind(&details.caretaker)
            .bind(&details.caretaker_contact)
            .bind(details.last_maintenance_date)
            .bind(details.next_maintenance_date)
            .bind(&details.asset_photo)
            .bind(site_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::SiteNotFound)?;

        Ok(row.into())
    }

    async fn lock_site(&self, site_id: &str) -> Result<Box<dyn SiteLease>, AppError> {
        let mut tx = self.pool.begin().await?;

        // FOR UPDATE blocks other leases on this row until commit/rollback
        let row = sqlx::query_as::<_, SiteRow>(LOCK_SITE)
            .bind(site_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::SiteNotFound)?;

        let site = Site::from(row);

        Ok(Box::new(PgSiteLease {
            tx,
            site_id: site.id,
            lifecycle: site.lifecycle,
        }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Open transaction holding the site's row lock.
struct PgSiteLease {
    tx: Transaction<'static, Postgres>,
    site_id: String,
    lifecycle: SiteLifecycle,
}

#[async_trait]
impl SiteLease for PgSiteLease {
    fn lifecycle(&mut self) -> &mut SiteLifecycle {
        &mut self.lifecycle
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let PgSiteLease {
            mut tx,
            site_id,
            lifecycle,
        } = *self;

        sqlx::query(UPDATE_LIFECYCLE)
            .bind(lifecycle.key_status().as_str())
            .bind(lifecycle.access_authorized)
            .bind(lifecycle.key_access_authorized)
            .bind(lifecycle.pending_visitor.as_ref().map(Json))
            .bind(lifecycle.current_visitor.as_ref().map(Json))
            .bind(Json(&lifecycle.visitor_history))
            .bind(lifecycle.pending_key_log.as_ref().map(Json))
            .bind(lifecycle.current_key_log.as_ref().map(Json))
            .bind(Json(&lifecycle.key_history))
            .bind(&site_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
