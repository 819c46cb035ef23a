//! Handlers for the `/activities` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use blip_core::types::DbId;
use blip_db::models::activity::CreateActivity;

use crate::engine::{activities, geo_filter};
use crate::error::AppResult;
use crate::handlers::users::TierParams;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/activities
pub async fn create_activity(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateActivity>,
) -> AppResult<impl IntoResponse> {
    let activity = activities::create(&state.pool, auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: activity })))
}

/// GET /api/v1/activities/{id}
///
/// Includes the icon and participant ids.
pub async fn get_activity(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(activity_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view = activities::get(&state.pool, activity_id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// GET /api/v1/activities/nearby?tier=
pub async fn nearby_activities(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TierParams>,
) -> AppResult<impl IntoResponse> {
    let found = geo_filter::nearby_activities(&state.pool, auth.user_id, params.tier()?).await?;
    Ok(Json(DataResponse { data: found }))
}
