//! Transactional orchestration of the proximity engine.
//!
//! Each operation is one PostgreSQL transaction that locks the contended
//! rows, applies the pure rules from `blip_core`, writes, commits, and only
//! then emits events through the [`NotificationSink`](blip_events::NotificationSink).
//!
//! - [`requests`] -- the Join Activity / Meet Now request lifecycle.
//! - [`ledger`] -- atomic point transfers.
//! - [`connections`] -- the symmetric connection graph.
//! - [`geo_filter`] -- tiered nearby queries over users and activities.
//! - [`activities`] -- activity creation and lookup.
//! - [`presence`] -- location heartbeats and live route recomputation.

pub mod activities;
pub mod connections;
pub mod geo_filter;
pub mod ledger;
pub mod presence;
pub mod requests;

pub use connections::ConnectionGraph;
pub use ledger::Ledger;
pub use requests::RequestEngine;
