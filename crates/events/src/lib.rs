//! Blip event bus and notification plumbing.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: a state-change event addressed to one user.
//! - [`NotificationSink`]: the fire-and-forget interface the engine emits
//!   through. Delivery outcome never flows back to the emitter.
//! - [`EventPersistence`]: background writer filling the `notifications`
//!   inbox from the bus.

pub mod bus;
pub mod persistence;
pub mod sink;

pub use bus::{EventBus, PlatformEvent};
pub use persistence::EventPersistence;
pub use sink::NotificationSink;
