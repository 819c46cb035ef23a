use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use blip_core::types::DbId;
use blip_db::repositories::UserRepo;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Browsers cannot set headers on a WebSocket upgrade, so the token rides
/// in the query string.
#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    pub token: String,
}

/// Authenticate, then upgrade to a push-only socket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsAuthParams>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let auth = AuthUser::from_token(&params.token, &state)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, auth.user_id)))
}

/// Register the socket, forward pushes to it, and drain inbound frames
/// until the peer goes away. Closing a user's last socket marks them
/// offline.
async fn handle_socket(socket: WebSocket, state: AppState, user_id: DbId) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    let mut rx = state.ws_manager.add(conn_id.clone(), user_id).await;
    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    let remaining = state.ws_manager.remove(&conn_id).await;
    send_task.abort();

    if remaining == 0 {
        if let Err(e) = UserRepo::set_offline(&state.pool, user_id).await {
            tracing::error!(error = %e, user_id, "Failed to mark user offline");
        }
    }
    tracing::info!(conn_id = %conn_id, user_id, remaining, "WebSocket disconnected");
}
