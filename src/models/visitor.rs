//! Visitor access records and API request/response types.
//!
//! This module defines:
//! - `VisitorRecord`: a visit as it moves from pending to current to history
//! - `CheckOutRequest`: request body for checking a visitor out
//! - Response bodies for the access endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordFields;

/// A visit to a site.
///
/// The same shape is used for the pending request, the visitor currently on
/// site, and archived history entries. Exit fields are only populated once
/// the visitor has checked out.
///
/// # JSON Example (archived)
///
/// ```json
/// {
///   "id": "VIS-6f1c0c5e2e8b4a51a9d3f0e1c2b3a4d5",
///   "checkInTime": "2025-03-01T08:00:00Z",
///   "checkOutTime": "2025-03-01T11:30:00Z",
///   "exitPhoto": "data:image/jpeg;base64,...",
///   "loggedOutBy": "Officer Bob",
///   "loggedOutAt": "11:30",
///   "name": "Alice",
///   "company": "Acme Towers"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
    /// `REQ-…` while pending, `VIS-…` once checked in
    pub id: String,

    /// Set when access is requested, not when the visitor actually enters
    pub check_in_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_out_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_photo: Option<String>,

    /// Name of the officer who logged the visitor out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_out_by: Option<String>,

    /// Logout time as reported by the officer's client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_out_at: Option<String>,

    /// Caller-supplied visitor details
    #[serde(flatten)]
    pub details: RecordFields,
}

/// Keys the server owns on a visitor record.
pub(crate) const RESERVED_VISITOR_FIELDS: &[&str] = &[
    "id",
    "siteId",
    "checkInTime",
    "checkOutTime",
    "exitPhoto",
    "loggedOutBy",
    "loggedOutAt",
];

/// Exit metadata captured at checkout.
#[derive(Debug, Clone, Default)]
pub struct VisitorExit {
    pub exit_photo: Option<String>,
    pub officer_name: Option<String>,
    pub officer_time: Option<String>,
}

/// Request body for `POST /api/access/checkout/{site_id}`.
///
/// ```json
/// {
///   "exitPhoto": "data:image/jpeg;base64,...",
///   "name": "Officer Bob",
///   "time": "11:30"
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutRequest {
    #[serde(default)]
    pub exit_photo: Option<String>,

    /// Logging-out officer's name
    #[serde(default)]
    pub name: Option<String>,

    /// Logging-out officer's time
    #[serde(default)]
    pub time: Option<String>,
}

impl From<CheckOutRequest> for VisitorExit {
    fn from(request: CheckOutRequest) -> Self {
        Self {
            exit_photo: request.exit_photo,
            officer_name: request.name,
            officer_time: request.time,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingVisitorResponse {
    pub success: bool,
    pub pending_visitor: VisitorRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentVisitorResponse {
    pub success: bool,
    pub current_visitor: VisitorRecord,
}
