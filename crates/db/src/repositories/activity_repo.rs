//! Repository for the `activities` and `activity_participants` tables.

use blip_core::geo::BoundingBox;
use blip_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::activity::Activity;

/// Column list for `activities` queries.
const COLUMNS: &str = "id, owner_id, activity_type, description, latitude, longitude, \
    max_participants, expires_at, is_active, created_at, updated_at";

/// Insert payload after validation and defaulting.
#[derive(Debug)]
pub struct NewActivity<'a> {
    pub owner_id: DbId,
    pub activity_type: &'a str,
    pub description: Option<&'a str>,
    pub latitude: f64,
    pub longitude: f64,
    pub max_participants: i32,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// Provides activity and participant-set operations.
pub struct ActivityRepo;

impl ActivityRepo {
    pub async fn create(pool: &PgPool, input: &NewActivity<'_>) -> Result<Activity, sqlx::Error> {
        let query = format!(
            "INSERT INTO activities \
                (owner_id, activity_type, description, latitude, longitude, \
                 max_participants, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Activity>(&query)
            .bind(input.owner_id)
            .bind(input.activity_type)
            .bind(input.description)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.max_participants)
            .bind(input.created_at)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Activity>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM activities WHERE id = $1");
        sqlx::query_as::<_, Activity>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lock the activity row; serializes participant-set growth.
    pub async fn lock_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Activity>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM activities WHERE id = $1 FOR NO KEY UPDATE");
        sqlx::query_as::<_, Activity>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn count_participants(
        executor: impl PgExecutor<'_>,
        activity_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM activity_participants WHERE activity_id = $1")
            .bind(activity_id)
            .fetch_one(executor)
            .await
    }

    pub async fn is_participant(
        executor: impl PgExecutor<'_>,
        activity_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS( \
                SELECT 1 FROM activity_participants \
                WHERE activity_id = $1 AND user_id = $2)",
        )
        .bind(activity_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    pub async fn add_participant(
        executor: impl PgExecutor<'_>,
        activity_id: DbId,
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO activity_participants (activity_id, user_id) VALUES ($1, $2)")
            .bind(activity_id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Participant user ids in join order.
    pub async fn list_participants(
        pool: &PgPool,
        activity_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT user_id FROM activity_participants \
             WHERE activity_id = $1 \
             ORDER BY created_at, id",
        )
        .bind(activity_id)
        .fetch_all(pool)
        .await
    }

    /// Active, unexpired activities inside `bbox`.
    pub async fn list_active_in_box(
        pool: &PgPool,
        bbox: &BoundingBox,
        now: Timestamp,
    ) -> Result<Vec<Activity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM activities \
             WHERE is_active AND expires_at > $1 \
               AND latitude BETWEEN $2 AND $3 \
               AND longitude BETWEEN $4 AND $5 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Activity>(&query)
            .bind(now)
            .bind(bbox.min_latitude)
            .bind(bbox.max_latitude)
            .bind(bbox.min_longitude)
            .bind(bbox.max_longitude)
            .fetch_all(pool)
            .await
    }

    /// Clear `is_active` on every activity past its expiry.
    ///
    /// Returns the number of activities deactivated.
    pub async fn deactivate_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE activities SET is_active = false \
             WHERE is_active AND expires_at <= $1",
        )
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
