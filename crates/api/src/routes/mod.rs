pub mod activities;
pub mod connections;
pub mod health;
pub mod notification;
pub mod points;
pub mod requests;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws?token=                                       WebSocket push
///
/// /users                                           register (public)
/// /users/me                                        own profile
/// /users/me/location                               heartbeat (PUT)
/// /users/nearby?tier=                              nearby users
/// /users/nearby/counts                             per-tier counts
/// /users/{id}                                      public profile
///
/// /activities                                      create
/// /activities/nearby?tier=                         nearby active
/// /activities/{id}                                 get
///
/// /requests                                        create
/// /requests/incoming                               addressed to caller
/// /requests/outgoing                               sent by caller
/// /requests/{id}                                   poll
/// /requests/{id}/approve                           approve (POST)
/// /requests/{id}/reject                            reject (POST)
/// /requests/{id}/withdraw                          withdraw (POST)
///
/// /points/transfer                                 transfer (POST)
/// /points/balance                                  own balance
/// /points/transactions                             history
///
/// /connections                                     connected list
/// /connections/pending                             pending list
/// /connections/counts                              derived counts
/// /connections/{user_id}                           request (POST), remove (DELETE)
/// /connections/{user_id}/accept                    accept (POST)
/// /connections/{user_id}/reject                    reject (POST)
/// /connections/{user_id}/status                    status
///
/// /notifications                                   list
/// /notifications/read-all                          mark all read (POST)
/// /notifications/unread-count                      unread count
/// /notifications/{id}/read                         mark read (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/users", users::router())
        .nest("/activities", activities::router())
        .nest("/requests", requests::router())
        .nest("/points", points::router())
        .nest("/connections", connections::router())
        .nest("/notifications", notification::router())
}
