//! Geographic coordinates and the small amount of spherical math the
//! system needs: great-circle distance and linear interpolation between
//! two points.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84-style latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    /// Creates a location from latitude and longitude in degrees.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another location in kilometers (haversine).
    pub fn distance_km(&self, other: &Location) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Point on the straight line between `self` and `other` at the given
    /// progress ratio. The ratio is clamped to `[0, 1]`, so 0 is `self`
    /// and 1 is `other`.
    pub fn interpolate(&self, other: &Location, ratio: f64) -> Location {
        let ratio = ratio.clamp(0.0, 1.0);
        Location {
            lat: self.lat + (other.lat - self.lat) * ratio,
            lon: self.lon + (other.lon - self.lon) * ratio,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn distance_to_self_is_zero() {
        let loc = Location::new(52.52, 13.405);
        assert!(loc.distance_km(&loc).abs() < EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let berlin = Location::new(52.52, 13.405);
        let munich = Location::new(48.1374, 11.5755);
        let d1 = berlin.distance_km(&munich);
        let d2 = munich.distance_km(&berlin);
        assert!((d1 - d2).abs() < EPSILON);
    }

    #[test]
    fn berlin_to_munich_is_roughly_500km() {
        let berlin = Location::new(52.52, 13.405);
        let munich = Location::new(48.1374, 11.5755);
        let d = berlin.distance_km(&munich);
        assert!((d - 504.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn interpolate_endpoints() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(10.0, 10.0);
        assert_eq!(a.interpolate(&b, 0.0), a);
        assert_eq!(a.interpolate(&b, 1.0), b);
    }

    #[test]
    fn interpolate_quarter_of_the_way() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(10.0, 10.0);
        let p = a.interpolate(&b, 0.25);
        assert!((p.lat - 2.5).abs() < EPSILON);
        assert!((p.lon - 2.5).abs() < EPSILON);
    }

    #[test]
    fn interpolate_clamps_out_of_range_ratios() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(10.0, 10.0);
        assert_eq!(a.interpolate(&b, -0.5), a);
        assert_eq!(a.interpolate(&b, 1.5), b);
    }

    #[test]
    fn serialization_roundtrip() {
        let loc = Location::new(52.52, 13.405);
        let json = serde_json::to_string(&loc).unwrap();
        let back: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(loc, back);
    }
}
