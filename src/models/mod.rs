//! Data models for sites and their lifecycle records.
//!
//! This module contains the records stored on a site row, plus the JSON
//! request and response bodies exchanged with clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

/// Key custody records (pending, current and archived key loans)
pub mod key_log;
/// Site metadata and snapshots
pub mod site;
/// Visitor access records (pending, current and archived visits)
pub mod visitor;

/// Caller-supplied fields carried verbatim on a lifecycle record.
///
/// Clients attach whatever the front desk collected (name, company, ID
/// photo, purpose...). The server never interprets these fields; it only
/// removes keys that would shadow the fields it generates itself.
pub type RecordFields = Map<String, Value>;

/// Drop keys that collide with generated record fields.
pub(crate) fn strip_reserved(mut fields: RecordFields, reserved: &[&str]) -> RecordFields {
    for key in reserved {
        fields.remove(*key);
    }
    fields
}

/// Body of `POST /api/access/request` and `POST /api/keys/request`.
///
/// # JSON Example
///
/// ```json
/// {
///   "siteId": "TWR-001",
///   "name": "Alice",
///   "company": "Acme Towers"
/// }
/// ```
///
/// Everything except `siteId` ends up on the created record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteScopedRequest {
    #[serde(default)]
    pub site_id: Option<String>,

    #[serde(flatten)]
    pub fields: RecordFields,
}

impl SiteScopedRequest {
    /// Split the request into its validated site id and record fields.
    pub fn into_parts(self) -> Result<(String, RecordFields), AppError> {
        let site_id = site::validate_site_id(self.site_id.as_deref().unwrap_or_default())?;
        Ok((site_id.to_string(), self.fields))
    }
}

/// Response for transitions that return nothing but an acknowledgement.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
