//! Route definitions for the `/requests` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::requests;
use crate::state::AppState;

/// Routes mounted at `/requests`.
///
/// ```text
/// POST   /                          -> create_request
/// GET    /incoming                  -> list_incoming
/// GET    /outgoing                  -> list_outgoing
/// GET    /{id}                      -> check_request_status
/// POST   /{id}/approve              -> approve_request
/// POST   /{id}/reject               -> reject_request
/// POST   /{id}/withdraw             -> withdraw_request
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(requests::create_request))
        .route("/incoming", get(requests::list_incoming))
        .route("/outgoing", get(requests::list_outgoing))
        .route("/{id}", get(requests::check_request_status))
        .route("/{id}/approve", post(requests::approve_request))
        .route("/{id}/reject", post(requests::reject_request))
        .route("/{id}/withdraw", post(requests::withdraw_request))
}
