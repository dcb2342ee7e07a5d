//! Key custody transitions: request, authorize, cancel, confirm borrow, return.
//!
//! Independent of visitor access: a site may have a visitor on site and its
//! key out at the same time.

use chrono::{DateTime, Utc};

use super::{
    AuthorizationMode, DuplicateRequestMode, KEY_LOAN_PREFIX, KEY_REQUEST_PREFIX,
    LifecycleError, LifecyclePolicy, SiteLifecycle, next_id,
};
use crate::models::{
    RecordFields,
    key_log::{KeyLog, RESERVED_KEY_LOG_FIELDS},
    strip_reserved,
};

impl SiteLifecycle {
    pub fn request_key(
        &mut self,
        fields: RecordFields,
        policy: &LifecyclePolicy,
        now: DateTime<Utc>,
    ) -> Result<KeyLog, LifecycleError> {
        if self.pending_key_log.is_some()
            && policy.duplicate_requests == DuplicateRequestMode::Reject
        {
            return Err(LifecycleError::KeyRequestPending);
        }

        let log = KeyLog {
            id: next_id(KEY_REQUEST_PREFIX),
            borrow_time: now,
            return_time: None,
            return_photo: None,
            details: strip_reserved(fields, RESERVED_KEY_LOG_FIELDS),
        };

        self.pending_key_log = Some(log.clone());
        self.key_access_authorized = false;

        Ok(log)
    }

    /// Open the gate for the pending key request. The gate stays closed when
    /// nothing is pending.
    pub fn authorize_key(&mut self) {
        self.key_access_authorized = self.pending_key_log.is_some();
    }

    pub fn cancel_key(&mut self) {
        self.pending_key_log = None;
        self.key_access_authorized = false;
    }

    /// Hand the key over: the pending request becomes the current loan and
    /// the key is marked borrowed.
    pub fn confirm_borrow(&mut self, policy: &LifecyclePolicy) -> Result<KeyLog, LifecycleError> {
        if self.pending_key_log.is_none() {
            return Err(LifecycleError::NoPendingKeyRequest);
        }
        if policy.authorization == AuthorizationMode::Enforced && !self.key_access_authorized {
            return Err(LifecycleError::KeyAccessNotAuthorized);
        }
        if self.current_key_log.is_some() {
            return Err(LifecycleError::KeyAlreadyBorrowed);
        }

        let mut log = self
            .pending_key_log
            .take()
            .ok_or(LifecycleError::NoPendingKeyRequest)?;
        log.id = next_id(KEY_LOAN_PREFIX);

        self.current_key_log = Some(log.clone());
        self.key_access_authorized = false;

        Ok(log)
    }

    /// Take the key back and archive the loan.
    pub fn return_key(
        &mut self,
        return_photo: Option<String>,
        policy: &LifecyclePolicy,
        now: DateTime<Utc>,
    ) -> Result<KeyLog, LifecycleError> {
        let mut log = self
            .current_key_log
            .take()
            .ok_or(LifecycleError::NoBorrowedKey)?;

        log.return_time = Some(now.max(log.borrow_time));
        log.return_photo = return_photo;

        self.key_history.archive(log.clone(), policy.history_limit);

        Ok(log)
    }
}
