//! Handlers for the `/requests` resource.
//!
//! Clients poll `GET /requests/{id}` every `poll_interval_secs` while a
//! request is pending; the response carries the countdown and, once
//! approved, the route.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use blip_core::geo::GeoPoint;
use blip_core::proximity::RequestStatus;
use blip_core::types::DbId;
use blip_db::models::proximity_request::CreateProximityRequest;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 100;

/// Body of `POST /requests/{id}/approve`. Coordinates are optional; when
/// present they update the approver's position first.
#[derive(Debug, Default, Deserialize)]
pub struct ApproveBody {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ApproveBody {
    fn location(&self) -> Result<Option<GeoPoint>, AppError> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Some(GeoPoint::new(latitude, longitude)?)),
            (None, None) => Ok(None),
            _ => Err(AppError::BadRequest(
                "latitude and longitude must be sent together".into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RequestListParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

impl RequestListParams {
    fn status(&self) -> Result<Option<RequestStatus>, AppError> {
        self.status
            .as_deref()
            .map(|s| {
                RequestStatus::parse(s).map_err(|_| {
                    AppError::BadRequest(format!(
                        "Invalid status '{s}'. Must be one of: pending, approved, rejected, expired"
                    ))
                })
            })
            .transpose()
    }

    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedRequest {
    pub request_id: DbId,
    pub deadline_at: blip_core::types::Timestamp,
}

/// POST /api/v1/requests
pub async fn create_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProximityRequest>,
) -> AppResult<impl IntoResponse> {
    let request = state.request_engine().create(auth.user_id, &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedRequest {
                request_id: request.id,
                deadline_at: request.deadline_at,
            },
        }),
    ))
}

/// GET /api/v1/requests/{id}
///
/// Poll. Expires the request on read once its deadline has passed.
pub async fn check_request_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view = state
        .request_engine()
        .check_status(auth.user_id, request_id)
        .await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/requests/{id}/approve
pub async fn approve_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
    body: Option<Json<ApproveBody>>,
) -> AppResult<impl IntoResponse> {
    let location = body.map(|Json(b)| b).unwrap_or_default().location()?;
    let view = state
        .request_engine()
        .approve(auth.user_id, request_id, location)
        .await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/requests/{id}/reject
pub async fn reject_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view = state
        .request_engine()
        .reject(auth.user_id, request_id)
        .await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/requests/{id}/withdraw
pub async fn withdraw_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view = state
        .request_engine()
        .withdraw(auth.user_id, request_id)
        .await?;
    Ok(Json(DataResponse { data: view }))
}

/// GET /api/v1/requests/incoming?status=&limit=
pub async fn list_incoming(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<RequestListParams>,
) -> AppResult<impl IntoResponse> {
    let views = state
        .request_engine()
        .list_incoming(auth.user_id, params.status()?, params.limit())
        .await?;
    Ok(Json(DataResponse { data: views }))
}

/// GET /api/v1/requests/outgoing?status=&limit=
pub async fn list_outgoing(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<RequestListParams>,
) -> AppResult<impl IntoResponse> {
    let views = state
        .request_engine()
        .list_outgoing(auth.user_id, params.status()?, params.limit())
        .await?;
    Ok(Json(DataResponse { data: views }))
}
