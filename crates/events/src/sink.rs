//! The engine-facing side of notification delivery.

use crate::bus::{EventBus, PlatformEvent};

/// Fire-and-forget receiver of state-change events.
///
/// Emitting never fails and never blocks on delivery; callers emit only
/// after their transaction has committed.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, event: PlatformEvent);
}

impl NotificationSink for EventBus {
    fn emit(&self, event: PlatformEvent) {
        tracing::debug!(
            kind = event.kind.as_str(),
            recipient_id = event.recipient_id,
            "Emitting notification event",
        );
        self.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blip_core::notification::NotificationKind;

    #[tokio::test]
    async fn event_bus_delivers_through_trait_object() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let sink: &dyn NotificationSink = &bus;
        sink.emit(PlatformEvent::new(NotificationKind::ConnectionAccepted, 5).with_actor(6));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, NotificationKind::ConnectionAccepted);
        assert_eq!(received.recipient_id, 5);
    }
}
