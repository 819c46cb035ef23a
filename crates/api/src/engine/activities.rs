//! Activity creation and lookup.

use blip_core::activity::{self, DEFAULT_MAX_PARTICIPANTS};
use blip_core::error::CoreError;
use blip_core::geo::GeoPoint;
use blip_core::types::DbId;
use blip_db::models::activity::{Activity, CreateActivity};
use blip_db::repositories::activity_repo::NewActivity;
use blip_db::repositories::{ActivityRepo, UserRepo};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppResult;

/// An activity with its icon and current participant set.
///
/// `is_active` reflects the expiry instant even if the sweep has not run.
#[derive(Debug, Serialize)]
pub struct ActivityView {
    #[serde(flatten)]
    pub activity: Activity,
    pub icon: Option<&'static str>,
    pub participant_count: usize,
    pub participants: Vec<DbId>,
}

pub async fn create(pool: &PgPool, owner_id: DbId, input: &CreateActivity) -> AppResult<Activity> {
    activity::validate_activity_type(&input.activity_type).map_err(CoreError::Validation)?;
    activity::validate_description(input.description.as_deref()).map_err(CoreError::Validation)?;
    let max_participants = input.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS);
    activity::validate_max_participants(max_participants).map_err(CoreError::Validation)?;
    let location = GeoPoint::new(input.latitude, input.longitude)?;

    UserRepo::find_by_id(pool, owner_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: owner_id,
        })?;

    let now = Utc::now();
    let new_activity = NewActivity {
        owner_id,
        activity_type: &input.activity_type,
        description: input.description.as_deref(),
        latitude: location.latitude,
        longitude: location.longitude,
        max_participants,
        created_at: now,
        expires_at: activity::expires_at(now),
    };
    let created = ActivityRepo::create(pool, &new_activity).await?;

    tracing::info!(
        activity_id = created.id,
        owner_id,
        activity_type = %created.activity_type,
        max_participants,
        "Activity created",
    );
    Ok(created)
}

pub async fn get(pool: &PgPool, activity_id: DbId) -> AppResult<ActivityView> {
    let mut found = ActivityRepo::find_by_id(pool, activity_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Activity",
            id: activity_id,
        })?;
    found.is_active = found.active_at(Utc::now());

    let participants = ActivityRepo::list_participants(pool, activity_id).await?;
    Ok(ActivityView {
        icon: activity::icon_for(&found.activity_type),
        activity: found,
        participant_count: participants.len(),
        participants,
    })
}
