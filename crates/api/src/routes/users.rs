//! Route definitions for the `/users` resource.
//!
//! Registration is public; everything else requires authentication.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// POST   /                          -> register
/// GET    /me                        -> get_me
/// PUT    /me/location               -> update_location
/// GET    /nearby                    -> nearby
/// GET    /nearby/counts             -> nearby_counts
/// GET    /{id}                      -> get_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(users::register))
        .route("/me", get(users::get_me))
        .route("/me/location", put(users::update_location))
        .route("/nearby", get(users::nearby))
        .route("/nearby/counts", get(users::nearby_counts))
        .route("/{id}", get(users::get_user))
}
