//! Route definitions for the `/points` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::points;
use crate::state::AppState;

/// Routes mounted at `/points`.
///
/// ```text
/// POST   /transfer                  -> transfer_points
/// GET    /balance                   -> get_balance
/// GET    /transactions              -> list_transactions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transfer", post(points::transfer_points))
        .route("/balance", get(points::get_balance))
        .route("/transactions", get(points::list_transactions))
}
