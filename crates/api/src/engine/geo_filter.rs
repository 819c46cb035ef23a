//! Tiered nearby queries.
//!
//! The SQL side narrows candidates with a degree bounding box; the exact
//! haversine check and tier classification happen here.

use blip_core::activity;
use blip_core::error::CoreError;
use blip_core::geo::{bounding_box, distance_meters, tier_for, DistanceTier, GeoPoint, TierCounts};
use blip_core::presence::PRESENCE_STALE_SECS;
use blip_core::types::DbId;
use blip_db::models::activity::Activity;
use blip_db::models::user::PublicProfile;
use blip_db::repositories::{ActivityRepo, UserRepo};
use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppResult;

/// A nearby user with the tightest tier that contains them.
#[derive(Debug, Serialize)]
pub struct NearbyUser {
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub distance_meters: f64,
    pub tier: Option<DistanceTier>,
}

#[derive(Debug, Serialize)]
pub struct NearbyActivity {
    #[serde(flatten)]
    pub activity: Activity,
    pub icon: Option<&'static str>,
    pub distance_meters: f64,
}

/// The caller's stored position. Nearby queries need one.
async fn caller_location(pool: &PgPool, user_id: DbId) -> AppResult<GeoPoint> {
    let user = UserRepo::find_by_id(pool, user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })?;
    Ok(user.location().ok_or_else(|| {
        CoreError::Validation("Set your location before searching nearby".into())
    })?)
}

/// Online users within `tier` of the caller, nearest first.
pub async fn nearby_users(
    pool: &PgPool,
    user_id: DbId,
    tier: DistanceTier,
) -> AppResult<Vec<NearbyUser>> {
    let origin = caller_location(pool, user_id).await?;
    let now = Utc::now();
    let seen_since = now - Duration::seconds(PRESENCE_STALE_SECS);
    let bbox = bounding_box(&origin, tier.threshold_meters());

    let candidates = UserRepo::list_online_in_box(pool, user_id, &bbox, seen_since).await?;

    let mut nearby = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let Some(point) = candidate.location() else {
            continue;
        };
        let distance = distance_meters(&origin, &point)?;
        if distance <= tier.threshold_meters() {
            nearby.push(NearbyUser {
                profile: candidate.to_public(now),
                distance_meters: distance,
                tier: tier_for(distance),
            });
        }
    }
    nearby.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));

    tracing::debug!(user_id, tier = tier.as_str(), count = nearby.len(), "Nearby users");
    Ok(nearby)
}

/// Cumulative online-user counts for every tier around the caller.
pub async fn counts_by_range(pool: &PgPool, user_id: DbId) -> AppResult<TierCounts> {
    let origin = caller_location(pool, user_id).await?;
    let seen_since = Utc::now() - Duration::seconds(PRESENCE_STALE_SECS);
    let bbox = bounding_box(&origin, DistanceTier::Continental.threshold_meters());

    let candidates = UserRepo::list_online_in_box(pool, user_id, &bbox, seen_since).await?;
    let mut distances = Vec::with_capacity(candidates.len());
    for point in candidates.iter().filter_map(|c| c.location()) {
        distances.push(distance_meters(&origin, &point)?);
    }
    Ok(TierCounts::from_distances(distances))
}

/// Active activities within `tier` of the caller, nearest first.
pub async fn nearby_activities(
    pool: &PgPool,
    user_id: DbId,
    tier: DistanceTier,
) -> AppResult<Vec<NearbyActivity>> {
    let origin = caller_location(pool, user_id).await?;
    let bbox = bounding_box(&origin, tier.threshold_meters());

    let candidates = ActivityRepo::list_active_in_box(pool, &bbox, Utc::now()).await?;

    let mut nearby = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let distance = distance_meters(&origin, &candidate.location())?;
        if distance <= tier.threshold_meters() {
            nearby.push(NearbyActivity {
                icon: activity::icon_for(&candidate.activity_type),
                activity: candidate,
                distance_meters: distance,
            });
        }
    }
    nearby.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
    Ok(nearby)
}
