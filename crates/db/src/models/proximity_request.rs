//! Proximity request rows and DTOs.

use blip_core::error::CoreError;
use blip_core::geo::GeoPoint;
use blip_core::proximity::{RequestKind, RequestStatus};
use blip_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `proximity_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProximityRequest {
    pub id: DbId,
    pub requester_id: DbId,
    pub target_id: DbId,
    pub activity_id: Option<DbId>,
    pub requester_latitude: f64,
    pub requester_longitude: f64,
    pub status: String,
    pub withdrawn: bool,
    pub deadline_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProximityRequest {
    pub fn status(&self) -> Result<RequestStatus, CoreError> {
        RequestStatus::parse(&self.status)
    }

    pub fn kind(&self) -> RequestKind {
        RequestKind::for_subject(self.activity_id)
    }

    pub fn requester_location(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.requester_latitude,
            longitude: self.requester_longitude,
        }
    }
}

/// DTO for opening a request.
#[derive(Debug, Deserialize)]
pub struct CreateProximityRequest {
    pub target_id: DbId,
    pub activity_id: Option<DbId>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Insert payload with the server-assigned timestamps.
#[derive(Debug)]
pub struct NewProximityRequest {
    pub requester_id: DbId,
    pub target_id: DbId,
    pub activity_id: Option<DbId>,
    pub requester_location: GeoPoint,
    pub created_at: Timestamp,
    pub deadline_at: Timestamp,
}
