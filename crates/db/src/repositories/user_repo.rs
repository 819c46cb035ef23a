//! Repository for the `users` table.

use blip_core::geo::{BoundingBox, GeoPoint};
use blip_core::ledger::WELCOME_BONUS_POINTS;
use blip_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::user::{CreateUser, User};

/// Column list for `users` queries.
const COLUMNS: &str = "id, display_name, latitude, longitude, location_updated_at, \
    points_balance, points_received, is_online, last_seen_at, created_at, updated_at";

/// Provides user profile, presence, and balance operations.
pub struct UserRepo;

impl UserRepo {
    /// Register a user with the welcome balance.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (display_name, points_balance) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.display_name.trim())
            .bind(WELCOME_BONUS_POINTS)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lock one user row for the rest of the transaction.
    pub async fn lock_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 FOR NO KEY UPDATE");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lock several user rows in ascending id order.
    ///
    /// A fixed lock order keeps two transfers between the same pair in
    /// opposite directions from deadlocking.
    pub async fn lock_many(
        executor: impl PgExecutor<'_>,
        ids: &[DbId],
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE id = ANY($1) ORDER BY id FOR NO KEY UPDATE"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    /// Record a heartbeat: overwrite the position and mark the user online.
    pub async fn update_location(
        pool: &PgPool,
        id: DbId,
        point: &GeoPoint,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET \
                latitude = $2, longitude = $3, location_updated_at = NOW(), \
                is_online = true, last_seen_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(point.latitude)
            .bind(point.longitude)
            .fetch_optional(pool)
            .await
    }

    /// Clear the online flag, e.g. when the last socket closes.
    pub async fn set_offline(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_online = false WHERE id = $1 AND is_online")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Online users with a position inside `bbox`, excluding `exclude_id`.
    ///
    /// The box is only a pre-filter; callers apply the exact distance check.
    pub async fn list_online_in_box(
        pool: &PgPool,
        exclude_id: DbId,
        bbox: &BoundingBox,
        seen_since: Timestamp,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users \
             WHERE id <> $1 \
               AND is_online AND last_seen_at >= $2 \
               AND latitude BETWEEN $3 AND $4 \
               AND longitude BETWEEN $5 AND $6"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(exclude_id)
            .bind(seen_since)
            .bind(bbox.min_latitude)
            .bind(bbox.max_latitude)
            .bind(bbox.min_longitude)
            .bind(bbox.max_longitude)
            .fetch_all(pool)
            .await
    }

    /// Debit the private balance. Returns the new balance.
    ///
    /// The row must already be locked and checked by the caller; the
    /// `CHECK (points_balance >= 0)` constraint is the last line.
    pub async fn debit_balance(
        executor: impl PgExecutor<'_>,
        id: DbId,
        amount: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE users SET points_balance = points_balance - $2 \
             WHERE id = $1 \
             RETURNING points_balance",
        )
        .bind(id)
        .bind(amount)
        .fetch_one(executor)
        .await
    }

    /// Credit the public received total. Returns the new total.
    pub async fn credit_received(
        executor: impl PgExecutor<'_>,
        id: DbId,
        amount: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE users SET points_received = points_received + $2 \
             WHERE id = $1 \
             RETURNING points_received",
        )
        .bind(id)
        .bind(amount)
        .fetch_one(executor)
        .await
    }
}
