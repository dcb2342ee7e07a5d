//! Site data models and API request/response types.
//!
//! This module defines:
//! - `Site`: a managed location, its static metadata and its lifecycle state
//! - `SiteDetails`: the administratively editable metadata
//! - `CreateSiteRequest`: request body for registering a site
//! - `SiteResponse`: full snapshot returned to clients

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

use crate::{
    error::AppError,
    lifecycle::{SiteLifecycle, history::History},
    models::{
        key_log::{KeyLog, KeyStatus},
        visitor::VisitorRecord,
    },
};

/// A managed physical location such as a telecom tower.
///
/// `details` may be edited administratively. `lifecycle` is only ever
/// changed by the access and key state machines.
#[derive(Debug, Clone)]
pub struct Site {
    /// Externally assigned identifier (e.g. "TWR-001")
    pub id: String,

    pub details: SiteDetails,

    pub lifecycle: SiteLifecycle,
}

/// Static, administratively editable site metadata.
///
/// Used as the body of `PUT /api/sites/{id}`. Lifecycle fields present in
/// the body (`keyStatus`, `pendingVisitor`, ...) are not part of this type
/// and are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDetails {
    pub name: String,

    /// Site category, e.g. "Outdoor" or "Indoor". `null` means the default.
    #[serde(
        rename = "type",
        default = "default_site_type",
        deserialize_with = "site_type_or_default"
    )]
    pub site_type: String,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub gps_coordinates: Option<String>,

    #[serde(default)]
    pub caretaker: Option<String>,

    #[serde(default)]
    pub caretaker_contact: Option<String>,

    /// Accepts `2025-06-01` or a full timestamp such as
    /// `2025-06-01T00:00:00.000Z`, of which only the date is kept.
    #[serde(default, deserialize_with = "lenient_date")]
    pub last_maintenance_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "lenient_date")]
    pub next_maintenance_date: Option<NaiveDate>,

    /// Photo reference (URL or data URL) of the site asset
    #[serde(default)]
    pub asset_photo: Option<String>,
}

fn default_site_type() -> String {
    "Outdoor".to_string()
}

fn site_type_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_site_type))
}

/// Blank strings and `null` read as no date.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|at| at.date_naive()))
        .map(Some)
        .map_err(|_| D::Error::custom(format!("invalid date: {raw}")))
}

impl SiteDetails {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Site name is required".to_string()));
        }
        Ok(())
    }
}

/// Request body for `POST /api/sites`.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "TWR-001",
///   "name": "Hilltop Tower",
///   "type": "Outdoor",
///   "address": "12 Ridge Rd",
///   "gpsCoordinates": "14.5995,120.9842",
///   "caretaker": "Juan",
///   "caretakerContact": "+63 900 000 0000",
///   "nextMaintenanceDate": "2025-06-01"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateSiteRequest {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(flatten)]
    pub details: SiteDetails,
}

impl CreateSiteRequest {
    /// Validated site id and metadata. New sites always start idle.
    pub fn into_parts(self) -> Result<(String, SiteDetails), AppError> {
        let id = validate_site_id(self.id.as_deref().unwrap_or_default())?.to_string();
        self.details.validate()?;
        Ok((id, self.details))
    }
}

/// Reject blank site identifiers.
pub fn validate_site_id(site_id: &str) -> Result<&str, AppError> {
    let trimmed = site_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("siteId is required".to_string()));
    }
    Ok(trimmed)
}

/// Full site snapshot returned by the site endpoints.
///
/// `keyStatus` is derived from `currentKeyLog` when the snapshot is built.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteResponse {
    pub id: String,

    #[serde(flatten)]
    pub details: SiteDetails,

    pub key_status: KeyStatus,
    pub access_authorized: bool,
    pub key_access_authorized: bool,

    pub pending_visitor: Option<VisitorRecord>,
    pub current_visitor: Option<VisitorRecord>,
    pub visitor_history: History<VisitorRecord>,

    pub pending_key_log: Option<KeyLog>,
    pub current_key_log: Option<KeyLog>,
    pub key_history: History<KeyLog>,
}

impl From<Site> for SiteResponse {
    fn from(site: Site) -> Self {
        let key_status = site.lifecycle.key_status();
        let lifecycle = site.lifecycle;

        Self {
            id: site.id,
            details: site.details,
            key_status,
            access_authorized: lifecycle.access_authorized,
            key_access_authorized: lifecycle.key_access_authorized,
            pending_visitor: lifecycle.pending_visitor,
            current_visitor: lifecycle.current_visitor,
            visitor_history: lifecycle.visitor_history,
            pending_key_log: lifecycle.pending_key_log,
            current_key_log: lifecycle.current_key_log,
            key_history: lifecycle.key_history,
        }
    }
}
