//! Handlers for the `/points` resource.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use blip_db::models::point_transaction::TransferPoints;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

/// POST /api/v1/points/transfer
pub async fn transfer_points(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<TransferPoints>,
) -> AppResult<impl IntoResponse> {
    let entry = state
        .ledger()
        .transfer(auth.user_id, input.recipient_id, input.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

/// GET /api/v1/points/balance
///
/// Private to the caller.
pub async fn get_balance(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let balance = state.ledger().balance(auth.user_id).await?;
    Ok(Json(DataResponse { data: balance }))
}

/// GET /api/v1/points/transactions?limit=
pub async fn list_transactions(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> AppResult<impl IntoResponse> {
    let entries = state.ledger().history(auth.user_id, params.limit).await?;
    Ok(Json(DataResponse { data: entries }))
}
