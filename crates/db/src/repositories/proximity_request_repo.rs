//! Repository for the `proximity_requests` table.
//!
//! Every status change goes through [`ProximityRequestRepo::resolve`] or
//! [`ProximityRequestRepo::expire_overdue`], both of which only match
//! `status = 'pending'`. A terminal row is never written again.

use blip_core::proximity::{RequestStatus, STATUS_EXPIRED, STATUS_PENDING};
use blip_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::proximity_request::{NewProximityRequest, ProximityRequest};

/// Column list for `proximity_requests` queries.
const COLUMNS: &str = "id, requester_id, target_id, activity_id, requester_latitude, \
    requester_longitude, status, withdrawn, deadline_at, resolved_at, created_at, updated_at";

/// Provides request lifecycle operations.
pub struct ProximityRequestRepo;

impl ProximityRequestRepo {
    /// Insert a pending request.
    ///
    /// Fails with a unique violation on `uq_proximity_requests_open` if an
    /// open request already exists for the tuple.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewProximityRequest,
    ) -> Result<ProximityRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO proximity_requests \
                (requester_id, target_id, activity_id, requester_latitude, \
                 requester_longitude, created_at, deadline_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProximityRequest>(&query)
            .bind(input.requester_id)
            .bind(input.target_id)
            .bind(input.activity_id)
            .bind(input.requester_location.latitude)
            .bind(input.requester_location.longitude)
            .bind(input.created_at)
            .bind(input.deadline_at)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ProximityRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM proximity_requests WHERE id = $1");
        sqlx::query_as::<_, ProximityRequest>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lock the request row. Concurrent transitions queue behind this.
    pub async fn lock_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ProximityRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM proximity_requests WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ProximityRequest>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lock the open request for a (requester, target, subject) tuple.
    pub async fn lock_open(
        executor: impl PgExecutor<'_>,
        requester_id: DbId,
        target_id: DbId,
        activity_id: Option<DbId>,
    ) -> Result<Option<ProximityRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM proximity_requests \
             WHERE requester_id = $1 AND target_id = $2 \
               AND activity_id IS NOT DISTINCT FROM $3 \
               AND status = $4 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, ProximityRequest>(&query)
            .bind(requester_id)
            .bind(target_id)
            .bind(activity_id)
            .bind(STATUS_PENDING)
            .fetch_optional(executor)
            .await
    }

    /// Requests sent by `requester_id` to `target_id` since `since`,
    /// in any status.
    pub async fn count_sent_since(
        executor: impl PgExecutor<'_>,
        requester_id: DbId,
        target_id: DbId,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM proximity_requests \
             WHERE requester_id = $1 AND target_id = $2 AND created_at >= $3",
        )
        .bind(requester_id)
        .bind(target_id)
        .bind(since)
        .fetch_one(executor)
        .await
    }

    /// Move a pending request to a terminal status.
    ///
    /// Returns the updated row, or `None` if the request was no longer
    /// pending.
    pub async fn resolve(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: RequestStatus,
        withdrawn: bool,
    ) -> Result<Option<ProximityRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE proximity_requests \
             SET status = $2, withdrawn = $3, resolved_at = NOW() \
             WHERE id = $1 AND status = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProximityRequest>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(withdrawn)
            .bind(STATUS_PENDING)
            .fetch_optional(executor)
            .await
    }

    /// Expire every pending request whose deadline is before `now`.
    ///
    /// Returns the rows this call expired; rows another writer resolved
    /// first are not included.
    pub async fn expire_overdue(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<ProximityRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE proximity_requests \
             SET status = $1, resolved_at = NOW() \
             WHERE status = $2 AND deadline_at < $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProximityRequest>(&query)
            .bind(STATUS_EXPIRED)
            .bind(STATUS_PENDING)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Requests addressed to `target_id`, newest first.
    pub async fn list_incoming(
        pool: &PgPool,
        target_id: DbId,
        status: Option<RequestStatus>,
        limit: i64,
    ) -> Result<Vec<ProximityRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM proximity_requests \
             WHERE target_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, ProximityRequest>(&query)
            .bind(target_id)
            .bind(status.map(RequestStatus::as_str))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Requests sent by `requester_id`, newest first.
    pub async fn list_outgoing(
        pool: &PgPool,
        requester_id: DbId,
        status: Option<RequestStatus>,
        limit: i64,
    ) -> Result<Vec<ProximityRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM proximity_requests \
             WHERE requester_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, ProximityRequest>(&query)
            .bind(requester_id)
            .bind(status.map(RequestStatus::as_str))
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
