//! Handlers for the `/users` resource: registration, profile, presence,
//! and nearby discovery.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use blip_core::error::CoreError;
use blip_core::geo::{DistanceTier, GeoPoint};
use blip_core::types::DbId;
use blip_db::models::user::{CreateUser, UpdateLocation, User};
use blip_db::repositories::UserRepo;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::generate_access_token;
use crate::engine::{geo_filter, presence};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Longest accepted display name, in characters.
const MAX_DISPLAY_NAME_LEN: usize = 50;

/// Registration result: the private profile and a bearer token.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: User,
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// `?tier=near|regional|continental`, defaulting to `near`.
#[derive(Debug, Deserialize)]
pub struct TierParams {
    pub tier: Option<String>,
}

impl TierParams {
    pub fn tier(&self) -> Result<DistanceTier, CoreError> {
        self.tier
            .as_deref()
            .map_or(Ok(DistanceTier::Near), DistanceTier::parse)
    }
}

/// POST /api/v1/users
///
/// Register a user with the welcome balance and issue an access token.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> AppResult<impl IntoResponse> {
    let name = input.display_name.trim();
    if name.is_empty() || name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(AppError::Core(CoreError::Validation(format!(
            "display_name must be 1 to {MAX_DISPLAY_NAME_LEN} characters"
        ))));
    }

    let user = UserRepo::create(&state.pool, &input).await?;
    let access_token = generate_access_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: RegisterResponse {
                user,
                access_token,
                token_type: "Bearer",
                expires_in: state.config.jwt.access_token_expiry_mins * 60,
            },
        }),
    ))
}

/// GET /api/v1/users/me
///
/// The caller's full profile, including the private balance.
pub async fn get_me(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    Ok(Json(DataResponse { data: user }))
}

/// GET /api/v1/users/{id}
///
/// Another user's public profile.
pub async fn get_user(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;
    Ok(Json(DataResponse {
        data: user.to_public(Utc::now()),
    }))
}

/// PUT /api/v1/users/me/location
///
/// Location heartbeat. Also keeps live routes current.
pub async fn update_location(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateLocation>,
) -> AppResult<impl IntoResponse> {
    let point = GeoPoint::new(input.latitude, input.longitude)?;
    let heartbeat = presence::record_heartbeat(&state.pool, auth.user_id, point).await?;
    Ok(Json(DataResponse { data: heartbeat }))
}

/// GET /api/v1/users/nearby?tier=
pub async fn nearby(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TierParams>,
) -> AppResult<impl IntoResponse> {
    let users = geo_filter::nearby_users(&state.pool, auth.user_id, params.tier()?).await?;
    Ok(Json(DataResponse { data: users }))
}

/// GET /api/v1/users/nearby/counts
///
/// Online users per tier. Counts are cumulative across tiers.
pub async fn nearby_counts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let counts = geo_filter::counts_by_range(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: counts }))
}
