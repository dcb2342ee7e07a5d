//! Visitor access transitions: request, authorize, cancel, check-in, check-out.

use chrono::{DateTime, Utc};

use super::{
    ACCESS_REQUEST_PREFIX, AuthorizationMode, DuplicateRequestMode, LifecycleError,
    LifecyclePolicy, SiteLifecycle, VISIT_PREFIX, next_id,
};
use crate::models::{
    RecordFields, strip_reserved,
    visitor::{RESERVED_VISITOR_FIELDS, VisitorExit, VisitorRecord},
};

impl SiteLifecycle {
    /// Register a visitor awaiting authorization.
    ///
    /// Replaces any request already pending unless the policy rejects
    /// duplicates. Always closes the authorization gate.
    pub fn request_access(
        &mut self,
        fields: RecordFields,
        policy: &LifecyclePolicy,
        now: DateTime<Utc>,
    ) -> Result<VisitorRecord, LifecycleError> {
        if self.pending_visitor.is_some()
            && policy.duplicate_requests == DuplicateRequestMode::Reject
        {
            return Err(LifecycleError::AccessRequestPending);
        }

        let visitor = VisitorRecord {
            id: next_id(ACCESS_REQUEST_PREFIX),
            check_in_time: now,
            check_out_time: None,
            exit_photo: None,
            logged_out_by: None,
            logged_out_at: None,
            details: strip_reserved(fields, RESERVED_VISITOR_FIELDS),
        };

        self.pending_visitor = Some(visitor.clone());
        self.access_authorized = false;

        Ok(visitor)
    }

    /// Open the gate for the pending visitor's check-in.
    ///
    /// Never fails. Without a pending visitor there is nothing to authorize
    /// and the gate stays closed.
    pub fn authorize_access(&mut self) {
        self.access_authorized = self.pending_visitor.is_some();
    }

    /// Discard the pending request, if any.
    pub fn cancel_access(&mut self) {
        self.pending_visitor = None;
        self.access_authorized = false;
    }

    /// Admit the pending visitor.
    ///
    /// The visitor is re-identified with a `VIS-` id. The request
    /// time is kept as `checkInTime`.
    pub fn check_in(&mut self, policy: &LifecyclePolicy) -> Result<VisitorRecord, LifecycleError> {
        if self.pending_visitor.is_none() {
            return Err(LifecycleError::NoPendingVisitor);
        }
        if policy.authorization == AuthorizationMode::Enforced && !self.access_authorized {
            return Err(LifecycleError::AccessNotAuthorized);
        }
        if self.current_visitor.is_some() {
            return Err(LifecycleError::VisitorOnSite);
        }

        let mut visitor = self
            .pending_visitor
            .take()
            .ok_or(LifecycleError::NoPendingVisitor)?;
        visitor.id = next_id(VISIT_PREFIX);

        self.current_visitor = Some(visitor.clone());
        self.access_authorized = false;

        Ok(visitor)
    }

    /// Log the current visitor out and archive the visit.
    pub fn check_out(
        &mut self,
        exit: VisitorExit,
        policy: &LifecyclePolicy,
        now: DateTime<Utc>,
    ) -> Result<VisitorRecord, LifecycleError> {
        let mut visitor = self
            .current_visitor
            .take()
            .ok_or(LifecycleError::NoCurrentVisitor)?;

        // Clock skew must not produce an exit before the entry.
        visitor.check_out_time = Some(now.max(visitor.check_in_time));
        visitor.exit_photo = exit.exit_photo;
        visitor.logged_out_by = exit.officer_name;
        visitor.logged_out_at = exit.officer_time;

        self.visitor_history
            .archive(visitor.clone(), policy.history_limit);

        Ok(visitor)
    }
}
