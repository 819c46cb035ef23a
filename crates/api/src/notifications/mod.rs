//! Push delivery of engine events.
//!
//! [`NotificationRouter`] subscribes to the event bus and forwards each
//! event to the recipient's open WebSocket connections. Durable storage is
//! handled separately by `blip_events::EventPersistence`.

pub mod router;

pub use router::NotificationRouter;
