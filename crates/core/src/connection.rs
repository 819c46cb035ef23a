//! Symmetric connection graph rules.
//!
//! A pair is stored once with `user_low < user_high`, so `A-B` and `B-A`
//! resolve to the same row.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const CONNECTION_PENDING: &str = "pending";
pub const CONNECTION_CONNECTED: &str = "connected";

/// Stored state of a connection row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Pending,
    Connected,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Pending => CONNECTION_PENDING,
            ConnectionState::Connected => CONNECTION_CONNECTED,
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            CONNECTION_PENDING => Ok(ConnectionState::Pending),
            CONNECTION_CONNECTED => Ok(ConnectionState::Connected),
            other => Err(CoreError::Internal(format!(
                "Unknown connection state '{other}'"
            ))),
        }
    }
}

/// Connection status as seen by one side of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    None,
    PendingOutgoing,
    PendingIncoming,
    Connected,
}

impl ConnectionStatus {
    /// Project a stored row onto `viewer`'s perspective.
    pub fn for_viewer(state: Option<ConnectionState>, requester_id: DbId, viewer: DbId) -> Self {
        match state {
            None => ConnectionStatus::None,
            Some(ConnectionState::Connected) => ConnectionStatus::Connected,
            Some(ConnectionState::Pending) if requester_id == viewer => {
                ConnectionStatus::PendingOutgoing
            }
            Some(ConnectionState::Pending) => ConnectionStatus::PendingIncoming,
        }
    }
}

/// Canonical `(low, high)` ordering of a pair.
pub fn ordered_pair(a: DbId, b: DbId) -> (DbId, DbId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A user cannot connect with themselves.
pub fn validate_pair(a: DbId, b: DbId) -> Result<(), CoreError> {
    if a == b {
        return Err(CoreError::Validation(
            "Cannot connect with yourself".into(),
        ));
    }
    Ok(())
}

/// Only the side that did not initiate may accept a pending connection.
pub fn can_accept(actor: DbId, requester_id: DbId) -> Result<(), CoreError> {
    if actor == requester_id {
        return Err(CoreError::Forbidden(
            "Cannot accept your own connection request".into(),
        ));
    }
    Ok(())
}

/// Other side of a pair relative to `viewer`.
pub fn other_side(user_low: DbId, user_high: DbId, viewer: DbId) -> DbId {
    if viewer == user_low {
        user_high
    } else {
        user_low
    }
}
