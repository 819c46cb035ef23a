//! Blip API server library.
//!
//! Exposes config, state, error handling, the proximity engine, routes, and
//! WebSocket infrastructure so integration tests and the binary entrypoint
//! share them.

pub mod auth;
pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
