//! Notification inbox writer.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and stores every [`PlatformEvent`] as a row in `notifications`. It shuts
//! down when the bus sender is dropped.

use blip_core::types::DbId;
use blip_db::repositories::NotificationRepo;
use blip_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::PlatformEvent;

/// Background service that persists events as notifications.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            kind = event.kind.as_str(),
                            recipient_id = event.recipient_id,
                            "Failed to persist notification"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some notifications were not stored"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write one event to the recipient's inbox.
    pub async fn persist(pool: &DbPool, event: &PlatformEvent) -> Result<DbId, sqlx::Error> {
        NotificationRepo::create(
            pool,
            event.recipient_id,
            event.kind.as_str(),
            &stored_payload(event),
        )
        .await
    }
}

/// The event payload with source and actor folded in.
///
/// Non-object payloads are wrapped under `"data"`.
pub fn stored_payload(event: &PlatformEvent) -> serde_json::Value {
    let mut map = match &event.payload {
        serde_json::Value::Object(map) => map.clone(),
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("data".into(), other.clone());
            map
        }
    };
    if let (Some(entity_type), Some(entity_id)) =
        (&event.source_entity_type, event.source_entity_id)
    {
        map.insert("source_entity_type".into(), entity_type.clone().into());
        map.insert("source_entity_id".into(), entity_id.into());
    }
    if let Some(actor) = event.actor_user_id {
        map.insert("actor_user_id".into(), actor.into());
    }
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blip_core::notification::NotificationKind;

    #[test]
    fn stored_payload_folds_in_source_and_actor() {
        let event = PlatformEvent::new(NotificationKind::RequestCreated, 2)
            .with_source("proximity_request", 11)
            .with_actor(1)
            .with_payload(serde_json::json!({"kind": "meet_now"}));

        let stored = stored_payload(&event);
        assert_eq!(stored["kind"], "meet_now");
        assert_eq!(stored["source_entity_type"], "proximity_request");
        assert_eq!(stored["source_entity_id"], 11);
        assert_eq!(stored["actor_user_id"], 1);
    }

    #[test]
    fn stored_payload_wraps_scalars() {
        let event = PlatformEvent::new(NotificationKind::PointsReceived, 2)
            .with_payload(serde_json::json!(25));
        let stored = stored_payload(&event);
        assert_eq!(stored["data"], 25);
        assert!(stored.get("actor_user_id").is_none());
    }
}
