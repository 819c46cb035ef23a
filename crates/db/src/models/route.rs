//! Route rows.

use blip_core::geo::GeoPoint;
use blip_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `routes` table: the private path released on approval.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Route {
    pub id: DbId,
    pub request_id: DbId,
    pub requester_id: DbId,
    pub target_id: DbId,
    pub requester_latitude: f64,
    pub requester_longitude: f64,
    pub target_latitude: f64,
    pub target_longitude: f64,
    pub distance_meters: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Route {
    pub fn requester_point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.requester_latitude,
            longitude: self.requester_longitude,
        }
    }

    pub fn target_point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.target_latitude,
            longitude: self.target_longitude,
        }
    }
}

/// Endpoints and distance for inserting or recomputing a route.
#[derive(Debug, Clone, Copy)]
pub struct RouteGeometry {
    pub requester: GeoPoint,
    pub target: GeoPoint,
    pub distance_meters: f64,
}
