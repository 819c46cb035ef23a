//! Repository for the `connections` table.
//!
//! Pairs are always passed as `(user_low, user_high)`; see
//! [`blip_core::connection::ordered_pair`].

use blip_core::connection::{CONNECTION_CONNECTED, CONNECTION_PENDING};
use blip_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::connection::Connection;

/// Column list for `connections` queries.
const COLUMNS: &str =
    "id, user_low, user_high, requester_id, status, accepted_at, created_at, updated_at";

/// Provides connection edge operations.
pub struct ConnectionRepo;

impl ConnectionRepo {
    /// Insert a pending edge.
    ///
    /// Fails with a unique violation on `uq_connections_pair` if any edge
    /// already exists for the pair.
    pub async fn create_pending(
        executor: impl PgExecutor<'_>,
        user_low: DbId,
        user_high: DbId,
        requester_id: DbId,
    ) -> Result<Connection, sqlx::Error> {
        let query = format!(
            "INSERT INTO connections (user_low, user_high, requester_id, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Connection>(&query)
            .bind(user_low)
            .bind(user_high)
            .bind(requester_id)
            .bind(CONNECTION_PENDING)
            .fetch_one(executor)
            .await
    }

    pub async fn find_pair(
        executor: impl PgExecutor<'_>,
        user_low: DbId,
        user_high: DbId,
    ) -> Result<Option<Connection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM connections WHERE user_low = $1 AND user_high = $2"
        );
        sqlx::query_as::<_, Connection>(&query)
            .bind(user_low)
            .bind(user_high)
            .fetch_optional(executor)
            .await
    }

    pub async fn lock_pair(
        executor: impl PgExecutor<'_>,
        user_low: DbId,
        user_high: DbId,
    ) -> Result<Option<Connection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM connections \
             WHERE user_low = $1 AND user_high = $2 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Connection>(&query)
            .bind(user_low)
            .bind(user_high)
            .fetch_optional(executor)
            .await
    }

    /// Flip a pending edge to connected. `None` if it was not pending.
    pub async fn accept(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Connection>, sqlx::Error> {
        let query = format!(
            "UPDATE connections SET status = $2, accepted_at = NOW() \
             WHERE id = $1 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Connection>(&query)
            .bind(id)
            .bind(CONNECTION_CONNECTED)
            .bind(CONNECTION_PENDING)
            .fetch_optional(executor)
            .await
    }

    /// Delete the edge. Returns `true` if a row was removed.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM connections WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Connected edges touching `user_id`.
    pub async fn list_connected(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Connection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM connections \
             WHERE (user_low = $1 OR user_high = $1) AND status = $2 \
             ORDER BY accepted_at DESC, id DESC"
        );
        sqlx::query_as::<_, Connection>(&query)
            .bind(user_id)
            .bind(CONNECTION_CONNECTED)
            .fetch_all(pool)
            .await
    }

    /// Pending edges touching `user_id`, in either direction.
    pub async fn list_pending(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Connection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM connections \
             WHERE (user_low = $1 OR user_high = $1) AND status = $2 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Connection>(&query)
            .bind(user_id)
            .bind(CONNECTION_PENDING)
            .fetch_all(pool)
            .await
    }

    /// Derived counts: `(connected, pending incoming)`.
    pub async fn counts(pool: &PgPool, user_id: DbId) -> Result<(i64, i64), sqlx::Error> {
        sqlx::query_as(
            "SELECT \
                COUNT(*) FILTER (WHERE status = $2), \
                COUNT(*) FILTER (WHERE status = $3 AND requester_id <> $1) \
             FROM connections \
             WHERE user_low = $1 OR user_high = $1",
        )
        .bind(user_id)
        .bind(CONNECTION_CONNECTED)
        .bind(CONNECTION_PENDING)
        .fetch_one(pool)
        .await
    }
}
