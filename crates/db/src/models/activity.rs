//! Activity rows and DTOs.

use blip_core::geo::GeoPoint;
use blip_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `activities` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Activity {
    pub id: DbId,
    pub owner_id: DbId,
    pub activity_type: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub max_participants: i32,
    pub expires_at: Timestamp,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Activity {
    pub fn location(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Active means not swept and not past expiry.
    pub fn active_at(&self, now: Timestamp) -> bool {
        self.is_active && blip_core::activity::is_active(self.expires_at, now)
    }
}

/// DTO for creating an activity.
#[derive(Debug, Deserialize)]
pub struct CreateActivity {
    pub activity_type: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub max_participants: Option<i32>,
}
