//! Great-circle distance and distance-tier classification.
//!
//! Distances use the haversine formula on a spherical Earth. Tier
//! boundaries are inclusive: a point exactly 300 m away is `near`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Mean Earth radius used for all distance math.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Radius of the `near` tier.
pub const NEAR_THRESHOLD_METERS: f64 = 300.0;

/// Radius of the `regional` tier.
pub const REGIONAL_THRESHOLD_METERS: f64 = 25_000.0;

/// Radius of the `continental` tier.
pub const CONTINENTAL_THRESHOLD_METERS: f64 = 1_000_000.0;

// ---------------------------------------------------------------------------
// GeoPoint
// ---------------------------------------------------------------------------

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a validated point.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        let point = Self {
            latitude,
            longitude,
        };
        point.validate()?;
        Ok(point)
    }

    /// Reject NaN, infinities, and out-of-range degrees.
    pub fn validate(&self) -> Result<(), CoreError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lng_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(CoreError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// Haversine distance between two points, in meters.
///
/// Symmetric in its arguments and zero for identical points.
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> Result<f64, CoreError> {
    a.validate()?;
    b.validate()?;

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();

    Ok(EARTH_RADIUS_METERS * c)
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Named distance bucket used to bound candidate queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceTier {
    Near,
    Regional,
    Continental,
}

impl DistanceTier {
    /// All tiers, narrowest first.
    pub const ALL: [DistanceTier; 3] = [
        DistanceTier::Near,
        DistanceTier::Regional,
        DistanceTier::Continental,
    ];

    /// Inclusive outer radius of the tier.
    pub fn threshold_meters(self) -> f64 {
        match self {
            DistanceTier::Near => NEAR_THRESHOLD_METERS,
            DistanceTier::Regional => REGIONAL_THRESHOLD_METERS,
            DistanceTier::Continental => CONTINENTAL_THRESHOLD_METERS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistanceTier::Near => "near",
            DistanceTier::Regional => "regional",
            DistanceTier::Continental => "continental",
        }
    }

    /// Parse a tier name from a query string.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "near" => Ok(DistanceTier::Near),
            "regional" => Ok(DistanceTier::Regional),
            "continental" => Ok(DistanceTier::Continental),
            other => Err(CoreError::Validation(format!(
                "Invalid tier '{other}'. Must be one of: near, regional, continental"
            ))),
        }
    }
}

/// Whether `distance` falls inside `tier` (boundary inclusive).
pub fn classify(distance: f64, tier: DistanceTier) -> bool {
    distance.is_finite() && distance >= 0.0 && distance <= tier.threshold_meters()
}

/// The narrowest tier containing `distance`, if any.
pub fn tier_for(distance: f64) -> Option<DistanceTier> {
    DistanceTier::ALL
        .into_iter()
        .find(|tier| classify(distance, *tier))
}

/// Cumulative per-tier counts: a user 100 m away counts in all three tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub near: i64,
    pub regional: i64,
    pub continental: i64,
}

impl TierCounts {
    /// Count one distance into every tier that contains it.
    pub fn record(&mut self, distance: f64) {
        if classify(distance, DistanceTier::Near) {
            self.near += 1;
        }
        if classify(distance, DistanceTier::Regional) {
            self.regional += 1;
        }
        if classify(distance, DistanceTier::Continental) {
            self.continental += 1;
        }
    }

    pub fn from_distances(distances: impl IntoIterator<Item = f64>) -> Self {
        let mut counts = Self::default();
        for d in distances {
            counts.record(d);
        }
        counts
    }

    pub fn get(&self, tier: DistanceTier) -> i64 {
        match tier {
            DistanceTier::Near => self.near,
            DistanceTier::Regional => self.regional,
            DistanceTier::Continental => self.continental,
        }
    }
}

// ---------------------------------------------------------------------------
// Bounding box pre-filter
// ---------------------------------------------------------------------------

/// Degree box that fully contains a circle of `radius` meters.
///
/// Used as a cheap SQL pre-filter; callers must still run the exact
/// [`distance_meters`] check on every candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

/// Compute the pre-filter box around `center`.
///
/// Near the poles or across the antimeridian the longitude range widens to
/// the full `[-180, 180]`.
pub fn bounding_box(center: &GeoPoint, radius_meters: f64) -> BoundingBox {
    let d_lat = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
    let min_latitude = center.latitude - d_lat;
    let max_latitude = center.latitude + d_lat;

    if min_latitude <= -90.0 || max_latitude >= 90.0 {
        return BoundingBox {
            min_latitude: min_latitude.max(-90.0),
            max_latitude: max_latitude.min(90.0),
            min_longitude: -180.0,
            max_longitude: 180.0,
        };
    }

    // Longitude half-width at the circle's tangent latitude, not at the center.
    let ratio = (radius_meters / EARTH_RADIUS_METERS).sin() / center.latitude.to_radians().cos();
    if ratio >= 1.0 {
        return BoundingBox {
            min_latitude,
            max_latitude,
            min_longitude: -180.0,
            max_longitude: 180.0,
        };
    }
    let d_lng = ratio.asin().to_degrees();
    let min_longitude = center.longitude - d_lng;
    let max_longitude = center.longitude + d_lng;

    if min_longitude < -180.0 || max_longitude > 180.0 {
        return BoundingBox {
            min_latitude,
            max_latitude,
            min_longitude: -180.0,
            max_longitude: 180.0,
        };
    }

    BoundingBox {
        min_latitude,
        max_latitude,
        min_longitude,
        max_longitude,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    /// Point `meters` due north of `origin`.
    fn north_of(origin: &GeoPoint, meters: f64) -> GeoPoint {
        let d_lat = (meters / EARTH_RADIUS_METERS).to_degrees();
        point(origin.latitude + d_lat, origin.longitude)
    }

    // -----------------------------------------------------------------------
    // Distance
    // -----------------------------------------------------------------------

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = point(48.8566, 2.3522);
        assert_eq!(distance_meters(&p, &p).unwrap(), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (point(48.8566, 2.3522), point(51.5074, -0.1278)),
            (point(-33.8688, 151.2093), point(35.6762, 139.6503)),
            (point(0.0, 179.9), point(0.0, -179.9)),
            (point(89.9, 0.0), point(-89.9, 180.0)),
        ];
        for (a, b) in pairs {
            let ab = distance_meters(&a, &b).unwrap();
            let ba = distance_meters(&b, &a).unwrap();
            assert!((ab - ba).abs() < 1e-6, "{ab} != {ba}");
            assert!(ab >= 0.0);
        }
    }

    #[test]
    fn test_paris_to_london_is_about_344_km() {
        let d = distance_meters(&point(48.8566, 2.3522), &point(51.5074, -0.1278)).unwrap();
        assert!((d - 343_500.0).abs() < 2_000.0, "got {d}");
    }

    #[test]
    fn test_antipodal_distance_is_half_circumference() {
        let d = distance_meters(&point(0.0, 0.0), &point(0.0, 180.0)).unwrap();
        let half = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half).abs() < 1.0);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let good = point(0.0, 0.0);
        let bad = [
            GeoPoint { latitude: f64::NAN, longitude: 0.0 },
            GeoPoint { latitude: 90.5, longitude: 0.0 },
            GeoPoint { latitude: 0.0, longitude: -180.5 },
            GeoPoint { latitude: 0.0, longitude: f64::INFINITY },
        ];
        for b in bad {
            assert_matches!(
                distance_meters(&good, &b),
                Err(CoreError::InvalidCoordinate { .. })
            );
        }
        assert_matches!(GeoPoint::new(-91.0, 0.0), Err(CoreError::InvalidCoordinate { .. }));
    }

    #[test]
    fn test_extreme_valid_coordinates_accepted() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    #[test]
    fn test_tier_boundaries_are_inclusive() {
        for tier in DistanceTier::ALL {
            let t = tier.threshold_meters();
            assert!(classify(t, tier), "{} boundary should be inside", tier.as_str());
            assert!(classify(t - 0.001, tier));
            assert!(!classify(t + 0.001, tier), "{} just outside", tier.as_str());
        }
    }

    #[test]
    fn test_classify_rejects_negative_and_nan() {
        assert!(!classify(-1.0, DistanceTier::Continental));
        assert!(!classify(f64::NAN, DistanceTier::Continental));
    }

    #[test]
    fn test_tier_for_picks_narrowest() {
        assert_eq!(tier_for(0.0), Some(DistanceTier::Near));
        assert_eq!(tier_for(300.0), Some(DistanceTier::Near));
        assert_eq!(tier_for(300.5), Some(DistanceTier::Regional));
        assert_eq!(tier_for(25_000.0), Some(DistanceTier::Regional));
        assert_eq!(tier_for(999_999.0), Some(DistanceTier::Continental));
        assert_eq!(tier_for(1_000_000.1), None);
    }

    #[test]
    fn test_measured_distance_classifies_like_constant() {
        let origin = point(40.0, -74.0);
        let inside = north_of(&origin, 250.0);
        let outside = north_of(&origin, 350.0);
        let d_in = distance_meters(&origin, &inside).unwrap();
        let d_out = distance_meters(&origin, &outside).unwrap();
        assert!(classify(d_in, DistanceTier::Near));
        assert!(!classify(d_out, DistanceTier::Near));
        assert!(classify(d_out, DistanceTier::Regional));
    }

    #[test]
    fn test_tier_counts_are_cumulative() {
        let counts = TierCounts::from_distances([10.0, 300.0, 5_000.0, 900_000.0, 2_000_000.0]);
        assert_eq!(counts.near, 2);
        assert_eq!(counts.regional, 3);
        assert_eq!(counts.continental, 4);
        assert_eq!(counts.get(DistanceTier::Regional), 3);
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!(DistanceTier::parse("near").unwrap(), DistanceTier::Near);
        assert_eq!(DistanceTier::parse("continental").unwrap(), DistanceTier::Continental);
        assert_matches!(DistanceTier::parse("global"), Err(CoreError::Validation(_)));
    }

    // -----------------------------------------------------------------------
    // Bounding box
    // -----------------------------------------------------------------------

    #[test]
    fn test_bounding_box_contains_circle_edge() {
        let center = point(45.0, 10.0);
        let bbox = bounding_box(&center, REGIONAL_THRESHOLD_METERS);
        let edge = north_of(&center, REGIONAL_THRESHOLD_METERS - 1.0);
        assert!(edge.latitude <= bbox.max_latitude);
        assert!(bbox.min_longitude < center.longitude && center.longitude < bbox.max_longitude);
    }

    #[test]
    fn test_bounding_box_covers_tangent_latitude() {
        let center = point(60.0, 0.0);
        let far_east = point(61.259, 18.1);
        assert!(distance_meters(&center, &far_east).unwrap() < CONTINENTAL_THRESHOLD_METERS);

        let bbox = bounding_box(&center, CONTINENTAL_THRESHOLD_METERS);
        assert!((bbox.min_longitude..=bbox.max_longitude).contains(&far_east.longitude));
        assert!((bbox.min_latitude..=bbox.max_latitude).contains(&far_east.latitude));
    }

    #[test]
    fn test_bounding_box_widens_near_pole() {
        let bbox = bounding_box(&point(89.0, 0.0), CONTINENTAL_THRESHOLD_METERS);
        assert_eq!(bbox.min_longitude, -180.0);
        assert_eq!(bbox.max_longitude, 180.0);
        assert_eq!(bbox.max_latitude, 90.0);
    }

    #[test]
    fn test_bounding_box_widens_across_antimeridian() {
        let bbox = bounding_box(&point(0.0, 179.99), REGIONAL_THRESHOLD_METERS);
        assert_eq!(bbox.min_longitude, -180.0);
        assert_eq!(bbox.max_longitude, 180.0);
    }
}
