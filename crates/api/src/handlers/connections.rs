//! Handlers for the `/connections` resource.
//!
//! `{user_id}` is always the other side of the pair.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use blip_core::types::DbId;
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/connections/{user_id}
pub async fn send_connection_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view = state
        .connection_graph()
        .request(auth.user_id, user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// POST /api/v1/connections/{user_id}/accept
pub async fn accept_connection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view = state
        .connection_graph()
        .accept(auth.user_id, user_id)
        .await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/connections/{user_id}/reject
pub async fn reject_connection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state
        .connection_graph()
        .reject(auth.user_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/connections/{user_id}
pub async fn remove_connection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state
        .connection_graph()
        .remove(auth.user_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/connections/{user_id}/status
pub async fn connection_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let status = state
        .connection_graph()
        .status(auth.user_id, user_id)
        .await?;
    Ok(Json(DataResponse {
        data: json!({ "user_id": user_id, "status": status }),
    }))
}

/// GET /api/v1/connections
pub async fn list_connections(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let views = state.connection_graph().list(auth.user_id).await?;
    Ok(Json(DataResponse { data: views }))
}

/// GET /api/v1/connections/pending
///
/// Both directions; each entry's `status` says which.
pub async fn list_pending(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let views = state.connection_graph().pending(auth.user_id).await?;
    Ok(Json(DataResponse { data: views }))
}

/// GET /api/v1/connections/counts
pub async fn connection_counts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let counts = state.connection_graph().counts(auth.user_id).await?;
    Ok(Json(DataResponse { data: counts }))
}
