//! Per-site visitor access and key custody state machines.
//!
//! A site hosts two independent lifecycles that share one shape:
//!
//! ```text
//! Idle ──request──▶ Pending ──authorize──▶ Authorized
//!   ▲                  │  ▲                    │
//!   └─────cancel───────┘  └──────request───────┤
//!   │                                          ▼
//!   └──────checkout / return (archived)──── Active
//! ```
//!
//! Everything here is synchronous and storage-free. Callers load a
//! [`SiteLifecycle`] under a per-site lock, apply one transition, and persist
//! the result only if the transition succeeded. A failed transition never
//! leaves partial changes behind.

pub mod access;
pub mod history;
pub mod keys;

use serde::Deserialize;
use uuid::Uuid;

use crate::models::{
    key_log::{KeyLog, KeyStatus},
    visitor::VisitorRecord,
};
use history::History;

/// Default retention bound for both ledgers.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Lifecycle state stored on a site row.
///
/// Fields are crate-private: outside this module they are read through
/// accessors and changed only through the transitions in [`access`] and
/// [`keys`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteLifecycle {
    pub(crate) access_authorized: bool,
    pub(crate) key_access_authorized: bool,

    pub(crate) pending_visitor: Option<VisitorRecord>,
    pub(crate) current_visitor: Option<VisitorRecord>,
    pub(crate) visitor_history: History<VisitorRecord>,

    pub(crate) pending_key_log: Option<KeyLog>,
    pub(crate) current_key_log: Option<KeyLog>,
    pub(crate) key_history: History<KeyLog>,
}

impl SiteLifecycle {
    /// `Borrowed` exactly when a key loan is in progress.
    pub fn key_status(&self) -> KeyStatus {
        if self.current_key_log.is_some() {
            KeyStatus::Borrowed
        } else {
            KeyStatus::Available
        }
    }

    pub fn access_authorized(&self) -> bool {
        self.access_authorized
    }

    pub fn key_access_authorized(&self) -> bool {
        self.key_access_authorized
    }

    pub fn pending_visitor(&self) -> Option<&VisitorRecord> {
        self.pending_visitor.as_ref()
    }

    pub fn current_visitor(&self) -> Option<&VisitorRecord> {
        self.current_visitor.as_ref()
    }

    pub fn visitor_history(&self) -> &History<VisitorRecord> {
        &self.visitor_history
    }

    pub fn pending_key_log(&self) -> Option<&KeyLog> {
        self.pending_key_log.as_ref()
    }

    pub fn current_key_log(&self) -> Option<&KeyLog> {
        self.current_key_log.as_ref()
    }

    pub fn key_history(&self) -> &History<KeyLog> {
        &self.key_history
    }
}

/// Whether check-in and key confirmation require the authorization gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationMode {
    /// The gate is UI guidance only; transitions proceed without it.
    #[default]
    Advisory,
    /// Check-in/confirm fail unless the gate was set.
    Enforced,
}

/// What a new request does when one is already pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateRequestMode {
    /// Replace the pending record.
    #[default]
    Overwrite,
    /// Fail with a conflict and keep the pending record.
    Reject,
}

/// Tunables applied to every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub history_limit: usize,
    pub authorization: AuthorizationMode,
    pub duplicate_requests: DuplicateRequestMode,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            authorization: AuthorizationMode::default(),
            duplicate_requests: DuplicateRequestMode::default(),
        }
    }
}

/// A transition that cannot proceed from the site's current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("No pending visitor request for this site")]
    NoPendingVisitor,

    #[error("No visitor is checked in at this site")]
    NoCurrentVisitor,

    #[error("No pending key request for this site")]
    NoPendingKeyRequest,

    #[error("The key for this site is not borrowed")]
    NoBorrowedKey,

    #[error("Visitor access has not been authorized")]
    AccessNotAuthorized,

    #[error("Key access has not been authorized")]
    KeyAccessNotAuthorized,

    #[error("A visitor access request is already pending")]
    AccessRequestPending,

    #[error("A key request is already pending")]
    KeyRequestPending,

    #[error("A visitor is already checked in at this site")]
    VisitorOnSite,

    #[error("The key for this site is already borrowed")]
    KeyAlreadyBorrowed,
}

impl LifecycleError {
    /// The required pending or current record is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NoPendingVisitor
                | Self::NoCurrentVisitor
                | Self::NoPendingKeyRequest
                | Self::NoBorrowedKey
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::AccessNotAuthorized | Self::KeyAccessNotAuthorized)
    }
}

/// Generate a locally unique record id such as `VIS-3f2a…`.
pub(crate) fn next_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub(crate) const ACCESS_REQUEST_PREFIX: &str = "REQ";
pub(crate) const VISIT_PREFIX: &str = "VIS";
pub(crate) const KEY_REQUEST_PREFIX: &str = "KEYREQ";
pub(crate) const KEY_LOAN_PREFIX: &str = "KEY";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_prefix_and_differ() {
        let a = next_id(VISIT_PREFIX);
        let b = next_id(VISIT_PREFIX);

        assert!(a.starts_with("VIS-"));
        assert_eq!(a.len(), "VIS-".len() + 32);
        assert_ne!(a, b);
    }

    #[test]
    fn new_site_is_idle() {
        let lifecycle = SiteLifecycle::default();

        assert_eq!(lifecycle.key_status(), KeyStatus::Available);
        assert!(!lifecycle.access_authorized());
        assert!(!lifecycle.key_access_authorized());
        assert!(lifecycle.pending_visitor().is_none());
        assert!(lifecycle.current_key_log().is_none());
        assert!(lifecycle.visitor_history().is_empty());
    }

    #[test]
    fn error_classification() {
        assert!(LifecycleError::NoBorrowedKey.is_not_found());
        assert!(!LifecycleError::VisitorOnSite.is_not_found());
        assert!(LifecycleError::KeyAccessNotAuthorized.is_unauthorized());
    }
}
