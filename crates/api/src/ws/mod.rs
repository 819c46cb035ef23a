//! WebSocket push channel.
//!
//! Clients connect with `GET /api/v1/ws?token=<jwt>`; every notification
//! addressed to that user is pushed as a JSON text frame. Polling stays
//! the source of truth; the socket only shortens the delay.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
