//! Proximity request lifecycle ("Join Activity" and "Meet Now").
//!
//! A request starts `pending` and ends in exactly one of `approved`,
//! `rejected`, or `expired`. Terminal states never change. The functions
//! here decide transitions; the caller applies them under a row lock.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// A pending request expires this many minutes after creation.
pub const REQUEST_TTL_MINS: i64 = 25;

/// Suggested client polling interval for request status.
pub const POLL_INTERVAL_SECS: u64 = 3;

/// An approved route keeps tracking participant positions for this long.
pub const ROUTE_LIVE_MINS: i64 = 60;

/// Rolling window used by the daily request cap.
pub const DAILY_CAP_WINDOW_HOURS: i64 = 24;

/// Cap quoted in product copy; only enforced when configured.
pub const SUGGESTED_DAILY_CAP: u32 = 3;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";
pub const STATUS_EXPIRED: &str = "expired";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => STATUS_PENDING,
            RequestStatus::Approved => STATUS_APPROVED,
            RequestStatus::Rejected => STATUS_REJECTED,
            RequestStatus::Expired => STATUS_EXPIRED,
        }
    }

    /// Parse a stored status value.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            STATUS_PENDING => Ok(RequestStatus::Pending),
            STATUS_APPROVED => Ok(RequestStatus::Approved),
            STATUS_REJECTED => Ok(RequestStatus::Rejected),
            STATUS_EXPIRED => Ok(RequestStatus::Expired),
            other => Err(CoreError::Internal(format!(
                "Unknown request status '{other}'"
            ))),
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// Whether the request targets an activity or the user directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    JoinActivity,
    MeetNow,
}

impl RequestKind {
    pub fn for_subject(activity_id: Option<DbId>) -> Self {
        if activity_id.is_some() {
            RequestKind::JoinActivity
        } else {
            RequestKind::MeetNow
        }
    }
}

// ---------------------------------------------------------------------------
// Deadlines
// ---------------------------------------------------------------------------

/// Deadline for a request created at `created_at`.
pub fn deadline_for(created_at: Timestamp) -> Timestamp {
    created_at + Duration::minutes(REQUEST_TTL_MINS)
}

/// A request is overdue strictly after its deadline.
pub fn is_overdue(deadline: Timestamp, now: Timestamp) -> bool {
    now > deadline
}

/// Whole seconds left before the deadline, never negative.
pub fn seconds_remaining(deadline: Timestamp, now: Timestamp) -> i64 {
    (deadline - now).num_seconds().max(0)
}

/// Whether a route approved at `approved_at` still tracks positions.
pub fn route_is_live(approved_at: Timestamp, now: Timestamp) -> bool {
    now < approved_at + Duration::minutes(ROUTE_LIVE_MINS)
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Something that can move a request out of `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    /// Target accepts; releases the route.
    Approve,
    /// Target declines.
    Reject,
    /// Requester cancels before the deadline.
    Withdraw,
    /// Deadline passed (sweep or lazy check on read).
    Expire,
}

impl RequestAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestAction::Approve => "approve",
            RequestAction::Reject => "reject",
            RequestAction::Withdraw => "withdraw",
            RequestAction::Expire => "expire",
        }
    }
}

/// What the caller must write for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Write this terminal status.
    Apply(RequestStatus),
    /// The deadline passed first: write `expired`, then report the action
    /// as already resolved.
    ExpireInstead,
    /// Nothing to write (an early expiry check on a live request).
    Unchanged,
}

/// Decide the transition for `action` on a request currently in `current`.
///
/// Terminal requests reject every action with `AlreadyResolved`, which is
/// how concurrent approve / reject / expire calls converge: only the first
/// writer sees `pending`.
pub fn plan_transition(
    request_id: DbId,
    current: RequestStatus,
    deadline: Timestamp,
    now: Timestamp,
    action: RequestAction,
) -> Result<TransitionPlan, CoreError> {
    if current.is_terminal() {
        return Err(CoreError::AlreadyResolved {
            request_id,
            status: current.as_str().to_string(),
        });
    }

    let overdue = is_overdue(deadline, now);
    let plan = match action {
        RequestAction::Expire if overdue => TransitionPlan::Apply(RequestStatus::Expired),
        RequestAction::Expire => TransitionPlan::Unchanged,
        _ if overdue => TransitionPlan::ExpireInstead,
        RequestAction::Approve => TransitionPlan::Apply(RequestStatus::Approved),
        RequestAction::Reject => TransitionPlan::Apply(RequestStatus::Rejected),
        RequestAction::Withdraw => TransitionPlan::Apply(RequestStatus::Expired),
    };
    Ok(plan)
}

/// Check that `actor` may perform `action` on a request between
/// `requester_id` and `target_id`.
pub fn authorize_action(
    action: RequestAction,
    actor: DbId,
    requester_id: DbId,
    target_id: DbId,
) -> Result<(), CoreError> {
    let allowed = match action {
        RequestAction::Approve | RequestAction::Reject => actor == target_id,
        RequestAction::Withdraw => actor == requester_id,
        RequestAction::Expire => true,
    };
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Not allowed to {} this request",
            action.as_str()
        )))
    }
}

/// Only the two parties may read a request.
pub fn authorize_view(actor: DbId, requester_id: DbId, target_id: DbId) -> Result<(), CoreError> {
    if actor == requester_id || actor == target_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Not a party to this request".into(),
        ))
    }
}

/// Validate a new request before touching storage.
pub fn validate_new_request(requester_id: DbId, target_id: DbId) -> Result<(), CoreError> {
    if requester_id == target_id {
        return Err(CoreError::Validation(
            "Cannot send a request to yourself".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Daily cap policy
// ---------------------------------------------------------------------------

/// Limit on requests one requester may send the same target per
/// [`DAILY_CAP_WINDOW_HOURS`]. Disabled unless configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailyCap {
    limit: Option<u32>,
}

impl DailyCap {
    pub fn unlimited() -> Self {
        Self { limit: None }
    }

    pub fn new(limit: u32) -> Self {
        Self { limit: Some(limit) }
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Admit a new request given how many were sent in the window
    /// (open or resolved).
    pub fn check(&self, sent_in_window: i64) -> Result<(), CoreError> {
        match self.limit {
            Some(limit) if sent_in_window >= i64::from(limit) => {
                Err(CoreError::DailyCapReached { limit })
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    const REQUESTER: DbId = 1;
    const TARGET: DbId = 2;

    fn plan(
        current: RequestStatus,
        minutes_after_create: i64,
        action: RequestAction,
    ) -> Result<TransitionPlan, CoreError> {
        let created = Utc::now();
        let now = created + Duration::minutes(minutes_after_create);
        plan_transition(7, current, deadline_for(created), now, action)
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::Expired,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()).unwrap(), status);
        }
        assert_matches!(RequestStatus::parse("cancelled"), Err(CoreError::Internal(_)));
    }

    #[test]
    fn test_only_pending_is_open() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Expired.is_terminal());
    }

    #[test]
    fn test_kind_from_subject() {
        assert_eq!(RequestKind::for_subject(Some(3)), RequestKind::JoinActivity);
        assert_eq!(RequestKind::for_subject(None), RequestKind::MeetNow);
    }

    // -----------------------------------------------------------------------
    // Deadlines
    // -----------------------------------------------------------------------

    #[test]
    fn test_deadline_is_25_minutes() {
        let created = Utc::now();
        assert_eq!(deadline_for(created) - created, Duration::minutes(25));
    }

    #[test]
    fn test_overdue_is_strictly_after_deadline() {
        let deadline = Utc::now();
        assert!(!is_overdue(deadline, deadline));
        assert!(is_overdue(deadline, deadline + Duration::milliseconds(1)));
    }

    #[test]
    fn test_seconds_remaining_never_negative() {
        let deadline = Utc::now();
        assert_eq!(seconds_remaining(deadline, deadline + Duration::minutes(3)), 0);
        assert_eq!(seconds_remaining(deadline, deadline - Duration::seconds(90)), 90);
    }

    #[test]
    fn test_route_live_window() {
        let approved = Utc::now();
        assert!(route_is_live(approved, approved + Duration::minutes(59)));
        assert!(!route_is_live(approved, approved + Duration::minutes(60)));
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    #[test]
    fn test_pending_transitions_before_deadline() {
        assert_eq!(
            plan(RequestStatus::Pending, 5, RequestAction::Approve).unwrap(),
            TransitionPlan::Apply(RequestStatus::Approved)
        );
        assert_eq!(
            plan(RequestStatus::Pending, 5, RequestAction::Reject).unwrap(),
            TransitionPlan::Apply(RequestStatus::Rejected)
        );
        assert_eq!(
            plan(RequestStatus::Pending, 5, RequestAction::Withdraw).unwrap(),
            TransitionPlan::Apply(RequestStatus::Expired)
        );
        assert_eq!(
            plan(RequestStatus::Pending, 5, RequestAction::Expire).unwrap(),
            TransitionPlan::Unchanged
        );
    }

    #[test]
    fn test_overdue_request_expires_instead() {
        for action in [
            RequestAction::Approve,
            RequestAction::Reject,
            RequestAction::Withdraw,
        ] {
            assert_eq!(
                plan(RequestStatus::Pending, 26, action).unwrap(),
                TransitionPlan::ExpireInstead
            );
        }
        assert_eq!(
            plan(RequestStatus::Pending, 26, RequestAction::Expire).unwrap(),
            TransitionPlan::Apply(RequestStatus::Expired)
        );
    }

    #[test]
    fn test_terminal_requests_are_immutable() {
        for status in [
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::Expired,
        ] {
            for action in [
                RequestAction::Approve,
                RequestAction::Reject,
                RequestAction::Withdraw,
                RequestAction::Expire,
            ] {
                let err = plan(status, 1, action).unwrap_err();
                assert_matches!(err, CoreError::AlreadyResolved { request_id: 7, .. });
            }
        }
    }

    #[test]
    fn test_only_target_may_approve_or_reject() {
        assert!(authorize_action(RequestAction::Approve, TARGET, REQUESTER, TARGET).is_ok());
        assert_matches!(
            authorize_action(RequestAction::Approve, REQUESTER, REQUESTER, TARGET),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            authorize_action(RequestAction::Reject, 99, REQUESTER, TARGET),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn test_only_requester_may_withdraw() {
        assert!(authorize_action(RequestAction::Withdraw, REQUESTER, REQUESTER, TARGET).is_ok());
        assert_matches!(
            authorize_action(RequestAction::Withdraw, TARGET, REQUESTER, TARGET),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn test_view_limited_to_parties() {
        assert!(authorize_view(REQUESTER, REQUESTER, TARGET).is_ok());
        assert!(authorize_view(TARGET, REQUESTER, TARGET).is_ok());
        assert_matches!(authorize_view(3, REQUESTER, TARGET), Err(CoreError::Forbidden(_)));
    }

    #[test]
    fn test_self_request_rejected() {
        assert_matches!(validate_new_request(4, 4), Err(CoreError::Validation(_)));
        assert!(validate_new_request(4, 5).is_ok());
    }

    // -----------------------------------------------------------------------
    // Daily cap
    // -----------------------------------------------------------------------

    #[test]
    fn test_unlimited_cap_admits_everything() {
        let cap = DailyCap::unlimited();
        assert!(cap.check(1_000).is_ok());
        assert_eq!(cap.limit(), None);
    }

    #[test]
    fn test_cap_blocks_at_limit() {
        let cap = DailyCap::new(SUGGESTED_DAILY_CAP);
        assert!(cap.check(2).is_ok());
        assert_matches!(cap.check(3), Err(CoreError::DailyCapReached { limit: 3 }));
    }
}
