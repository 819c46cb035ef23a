//! Route definitions for the `/connections` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::connections;
use crate::state::AppState;

/// Routes mounted at `/connections`.
///
/// ```text
/// GET    /                          -> list_connections
/// GET    /pending                   -> list_pending
/// GET    /counts                    -> connection_counts
/// POST   /{user_id}                 -> send_connection_request
/// DELETE /{user_id}                 -> remove_connection
/// POST   /{user_id}/accept          -> accept_connection
/// POST   /{user_id}/reject          -> reject_connection
/// GET    /{user_id}/status          -> connection_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(connections::list_connections))
        .route("/pending", get(connections::list_pending))
        .route("/counts", get(connections::connection_counts))
        .route(
            "/{user_id}",
            post(connections::send_connection_request).delete(connections::remove_connection),
        )
        .route("/{user_id}/accept", post(connections::accept_connection))
        .route("/{user_id}/reject", post(connections::reject_connection))
        .route("/{user_id}/status", get(connections::connection_status))
}
