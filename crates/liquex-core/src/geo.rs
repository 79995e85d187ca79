//! Great-circle distance and the location types built on it.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Distance to `other` in meters.
    pub fn distance_to(&self, other: &Self) -> f64 {
        haversine_distance_m(*self, *other)
    }

    /// Shift the point by the given deltas in degrees.
    #[must_use]
    pub fn offset(self, d_lat: f64, d_lng: f64) -> Self {
        Self {
            lat: self.lat + d_lat,
            lng: self.lng + d_lng,
        }
    }
}

/// Haversine surface distance between two points, in meters.
///
/// The intermediate term is clamped to `[0, 1]` so rounding on
/// near-antipodal inputs cannot push `sqrt(1 - a)` into NaN.
pub fn haversine_distance_m(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Anything with a position and an owner name that proximity filtering can rank.
pub trait Located {
    fn location(&self) -> GeoPoint;

    /// Username this entity belongs to, used for self-exclusion.
    fn owner(&self) -> &str;
}

/// Display band for a distance, mirroring the green/yellow/red markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProximityBand {
    Near,
    Mid,
    Far,
    OutOfRange,
}

impl ProximityBand {
    pub fn classify(distance_m: f64, radius_m: f64) -> Self {
        if distance_m <= 100.0 {
            Self::Near
        } else if distance_m <= 300.0 {
            Self::Mid
        } else if distance_m <= radius_m {
            Self::Far
        } else {
            Self::OutOfRange
        }
    }

    pub const fn marker(self) -> &'static str {
        match self {
            Self::Near => "[near]",
            Self::Mid => "[mid]",
            Self::Far => "[far]",
            Self::OutOfRange => "[out]",
        }
    }
}
