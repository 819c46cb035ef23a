//! Repository for the `routes` table.

use blip_core::types::{DbId, Timestamp};
use sqlx::PgExecutor;

use crate::models::route::{Route, RouteGeometry};

/// Column list for `routes` queries.
const COLUMNS: &str = "id, request_id, requester_id, target_id, requester_latitude, \
    requester_longitude, target_latitude, target_longitude, distance_meters, \
    created_at, updated_at";

/// Provides route materialization and recomputation.
pub struct RouteRepo;

impl RouteRepo {
    /// Materialize the route for an approved request.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        request_id: DbId,
        requester_id: DbId,
        target_id: DbId,
        geometry: &RouteGeometry,
    ) -> Result<Route, sqlx::Error> {
        let query = format!(
            "INSERT INTO routes \
                (request_id, requester_id, target_id, requester_latitude, \
                 requester_longitude, target_latitude, target_longitude, distance_meters) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Route>(&query)
            .bind(request_id)
            .bind(requester_id)
            .bind(target_id)
            .bind(geometry.requester.latitude)
            .bind(geometry.requester.longitude)
            .bind(geometry.target.latitude)
            .bind(geometry.target.longitude)
            .bind(geometry.distance_meters)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_request(
        executor: impl PgExecutor<'_>,
        request_id: DbId,
    ) -> Result<Option<Route>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM routes WHERE request_id = $1");
        sqlx::query_as::<_, Route>(&query)
            .bind(request_id)
            .fetch_optional(executor)
            .await
    }

    /// Lock the routes `user_id` takes part in that were created at or
    /// after `since`, in id order.
    pub async fn lock_live_for_user(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<Route>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM routes \
             WHERE (requester_id = $1 OR target_id = $1) AND created_at >= $2 \
             ORDER BY id \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Route>(&query)
            .bind(user_id)
            .bind(since)
            .fetch_all(executor)
            .await
    }

    /// Overwrite both endpoints and the distance in place.
    pub async fn update_geometry(
        executor: impl PgExecutor<'_>,
        id: DbId,
        geometry: &RouteGeometry,
    ) -> Result<Route, sqlx::Error> {
        let query = format!(
            "UPDATE routes SET \
                requester_latitude = $2, requester_longitude = $3, \
                target_latitude = $4, target_longitude = $5, distance_meters = $6 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Route>(&query)
            .bind(id)
            .bind(geometry.requester.latitude)
            .bind(geometry.requester.longitude)
            .bind(geometry.target.latitude)
            .bind(geometry.target.longitude)
            .bind(geometry.distance_meters)
            .fetch_one(executor)
            .await
    }
}
