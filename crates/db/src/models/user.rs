//! User rows and profile DTOs.

use blip_core::geo::GeoPoint;
use blip_core::presence;
use blip_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
///
/// `points_balance` is private to the owner; use [`User::to_public`] for
/// anything shown to other users.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub display_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_updated_at: Option<Timestamp>,
    pub points_balance: i64,
    pub points_received: i64,
    pub is_online: bool,
    pub last_seen_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Last reported position, if any.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// Online flag adjusted for heartbeat staleness.
    pub fn online_at(&self, now: Timestamp) -> bool {
        presence::is_online(self.is_online, self.last_seen_at, now)
    }

    /// Profile fields visible to other users.
    pub fn to_public(&self, now: Timestamp) -> PublicProfile {
        PublicProfile {
            id: self.id,
            display_name: self.display_name.clone(),
            points_received: self.points_received,
            is_online: self.online_at(now),
        }
    }
}

/// What other users may see about a user.
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub id: DbId,
    pub display_name: String,
    pub points_received: i64,
    pub is_online: bool,
}

/// DTO for registering a user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub display_name: String,
}

/// DTO for a location heartbeat.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UpdateLocation {
    pub latitude: f64,
    pub longitude: f64,
}
