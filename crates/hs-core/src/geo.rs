//! Geographic coordinate type and spatial utilities.
//!
//! `GeoPoint` uses `f32` latitude/longitude.  At the equator this gives ~1 m
//! precision, far more than a regional freight network needs.

use serde::{Deserialize, Serialize};

/// A WGS-84 geographic coordinate stored as single-precision floats.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f32,
    pub lon: f32,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f32, lon: f32) -> Self {
        Self { lat, lon }
    }

    /// Haversine great-circle distance in metres.
    ///
    /// Accuracy: ±0.5 % (f32 rounding); good enough to derive edge lengths
    /// and base travel times between facilities.
    pub fn distance_m(self, other: GeoPoint) -> f32 {
        const R: f32 = 6_371_000.0; // mean Earth radius, metres

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        R * c
    }

    /// Linear interpolation between `self` and `other`.
    ///
    /// `t` is clamped to `[0, 1]`.  Used to place a mid-edge truck for
    /// snapshots; straight-line blending is accurate enough at edge scale.
    pub fn lerp(self, other: GeoPoint, t: f64) -> GeoPoint {
        let t = t.clamp(0.0, 1.0) as f32;
        GeoPoint {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}
