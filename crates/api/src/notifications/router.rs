//! Event-to-socket routing.

use std::sync::Arc;

use axum::extract::ws::Message;
use blip_events::PlatformEvent;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Pushes bus events to the recipient's sockets.
pub struct NotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Consume events until the bus closes.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.deliver(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Push one event. Returns how many sockets received it.
    pub async fn deliver(&self, event: &PlatformEvent) -> usize {
        let msg = push_message(event);
        let sent = self
            .ws_manager
            .send_to_user(event.recipient_id, Message::Text(msg.to_string().into()))
            .await;
        tracing::debug!(
            kind = event.kind.as_str(),
            recipient_id = event.recipient_id,
            sent,
            "Notification pushed",
        );
        sent
    }
}

/// JSON frame sent to clients.
pub fn push_message(event: &PlatformEvent) -> serde_json::Value {
    serde_json::json!({
        "type": "notification",
        "kind": event.kind,
        "source_entity_type": event.source_entity_type,
        "source_entity_id": event.source_entity_id,
        "actor_user_id": event.actor_user_id,
        "payload": event.payload,
        "timestamp": event.timestamp,
    })
}
