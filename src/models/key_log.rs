//! Key custody records and API request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordFields;

/// Whether a site's physical key is in the key box.
///
/// Never stored independently of the key logs: a site's status is
/// `Borrowed` exactly when it has a current key log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyStatus {
    Available,
    Borrowed,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Available => "Available",
            KeyStatus::Borrowed => "Borrowed",
        }
    }
}

/// One loan of a site's physical key.
///
/// `KEYREQ-…` while the request is pending, `KEY-…` once the borrow is
/// confirmed. Return fields are filled in when the key comes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyLog {
    pub id: String,

    pub borrow_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_photo: Option<String>,

    /// Caller-supplied borrower details
    #[serde(flatten)]
    pub details: RecordFields,
}

pub(crate) const RESERVED_KEY_LOG_FIELDS: &[&str] =
    &["id", "siteId", "borrowTime", "returnTime", "returnPhoto"];

/// Request body for `POST /api/keys/return/{site_id}`.
///
/// ```json
/// { "returnPhoto": "data:image/jpeg;base64,..." }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnKeyRequest {
    #[serde(default)]
    pub return_photo: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingKeyLogResponse {
    pub success: bool,
    pub pending_key_log: KeyLog,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentKeyLogResponse {
    pub success: bool,
    pub current_key_log: KeyLog,
}
