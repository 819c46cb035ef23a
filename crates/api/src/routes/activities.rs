//! Route definitions for the `/activities` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::activities;
use crate::state::AppState;

/// Routes mounted at `/activities`.
///
/// ```text
/// POST   /                          -> create_activity
/// GET    /nearby                    -> nearby_activities
/// GET    /{id}                      -> get_activity
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(activities::create_activity))
        .route("/nearby", get(activities::nearby_activities))
        .route("/{id}", get(activities::get_activity))
}
