//! Domain rules for the Blip proximity engine.
//!
//! Everything in this crate is pure: constants, value types, validation,
//! and the request state machine. Persistence lives in `blip-db` and the
//! HTTP surface in `blip-api`, so both can share one set of rules.

pub mod activity;
pub mod connection;
pub mod error;
pub mod geo;
pub mod ledger;
pub mod notification;
pub mod presence;
pub mod proximity;
pub mod types;
