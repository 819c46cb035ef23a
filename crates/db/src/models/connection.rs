//! Connection edge rows.

use blip_core::connection::{other_side, ConnectionState, ConnectionStatus};
use blip_core::error::CoreError;
use blip_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `connections` table. One row per unordered pair.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Connection {
    pub id: DbId,
    pub user_low: DbId,
    pub user_high: DbId,
    pub requester_id: DbId,
    pub status: String,
    pub accepted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Connection {
    pub fn state(&self) -> Result<ConnectionState, CoreError> {
        ConnectionState::parse(&self.status)
    }

    /// The other user from `viewer`'s side.
    pub fn peer_of(&self, viewer: DbId) -> DbId {
        other_side(self.user_low, self.user_high, viewer)
    }

    pub fn status_for(&self, viewer: DbId) -> Result<ConnectionStatus, CoreError> {
        Ok(ConnectionStatus::for_viewer(
            Some(self.state()?),
            self.requester_id,
            viewer,
        ))
    }
}
