//! Location heartbeats.
//!
//! A heartbeat stores the caller's position, marks them online, and moves
//! their endpoint on every route still inside its live window.

use blip_core::error::CoreError;
use blip_core::geo::{distance_meters, GeoPoint};
use blip_core::proximity::ROUTE_LIVE_MINS;
use blip_core::types::DbId;
use blip_db::models::route::RouteGeometry;
use blip_db::repositories::{RouteRepo, UserRepo};
use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppResult;

#[derive(Debug, Serialize)]
pub struct Heartbeat {
    pub user_id: DbId,
    pub latitude: f64,
    pub longitude: f64,
    pub is_online: bool,
    pub routes_updated: usize,
}

pub async fn record_heartbeat(pool: &PgPool, user_id: DbId, point: GeoPoint) -> AppResult<Heartbeat> {
    point.validate()?;
    let user = UserRepo::update_location(pool, user_id, &point)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })?;

    let routes_updated = recompute_routes(pool, user_id, point).await?;
    if routes_updated > 0 {
        tracing::debug!(user_id, routes_updated, "Live routes recomputed");
    }

    Ok(Heartbeat {
        user_id,
        latitude: point.latitude,
        longitude: point.longitude,
        is_online: user.online_at(Utc::now()),
        routes_updated,
    })
}

/// Replace `user_id`'s endpoint on each live route and refresh the distance.
async fn recompute_routes(pool: &PgPool, user_id: DbId, point: GeoPoint) -> AppResult<usize> {
    let since = Utc::now() - Duration::minutes(ROUTE_LIVE_MINS);

    let mut tx = pool.begin().await?;
    let routes = RouteRepo::lock_live_for_user(&mut *tx, user_id, since).await?;
    for route in &routes {
        let (requester, target) = if route.requester_id == user_id {
            (point, route.target_point())
        } else {
            (route.requester_point(), point)
        };
        let geometry = RouteGeometry {
            requester,
            target,
            distance_meters: distance_meters(&requester, &target)?,
        };
        RouteRepo::update_geometry(&mut *tx, route.id, &geometry).await?;
    }
    tx.commit().await?;

    Ok(routes.len())
}
