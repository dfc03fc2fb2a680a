//! Geographic coordinates and great-circle measurement.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

const METERS_PER_FOOT: f64 = 0.3048;
const FEET_PER_MILE: f64 = 5280.0;
const METERS_PER_KILOMETER: f64 = 1000.0;

/// A geographic coordinate in degrees.
///
/// This is the authoritative, persisted position of every shape vertex.
/// Screen positions are never stored; they are recomputed through the
/// current [`Projection`](crate::projection::Projection) on every pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude in degrees.
    pub lng: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Return this point shifted by a delta in degrees.
    pub fn offset(self, d_lng: f64, d_lat: f64) -> Self {
        Self::new(self.lng + d_lng, self.lat + d_lat)
    }

    /// Component-wise difference `self - other` as `(d_lng, d_lat)`.
    pub fn delta_from(self, other: GeoPoint) -> (f64, f64) {
        (self.lng - other.lng, self.lat - other.lat)
    }

    /// Great-circle distance in meters (haversine formula).
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

/// Unit system used when formatting dimension measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

/// Format a distance in meters as a human-readable measurement.
///
/// Imperial distances below one mile are whole feet, longer ones are miles
/// with two decimals. Metric follows the same split at one kilometer.
pub fn format_distance(meters: f64, units: Units) -> String {
    let meters = if meters.is_finite() { meters.max(0.0) } else { 0.0 };
    match units {
        Units::Imperial => {
            let feet = meters / METERS_PER_FOOT;
            if feet.round() < FEET_PER_MILE {
                format!("{} ft", feet.round() as i64)
            } else {
                format!("{:.2} mi", feet / FEET_PER_MILE)
            }
        }
        Units::Metric => {
            if meters.round() < METERS_PER_KILOMETER {
                format!("{} m", meters.round() as i64)
            } else {
                format!("{:.2} km", meters / METERS_PER_KILOMETER)
            }
        }
    }
}

/// Measure the great-circle distance between two points and format it.
pub fn measure(a: GeoPoint, b: GeoPoint, units: Units) -> String {
    format_distance(a.distance_m(b), units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        let p = GeoPoint::new(-118.24, 34.05);
        assert!(p.distance_m(p).abs() < f64::EPSILON);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0);
        let expected = EARTH_RADIUS_M * 1.0_f64.to_radians();
        assert!((a.distance_m(b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_hundred_feet() {
        // 30.48 m along a meridian
        let d_lat = (30.48 / EARTH_RADIUS_M).to_degrees();
        let a = GeoPoint::new(-118.24, 34.05);
        let b = a.offset(0.0, d_lat);
        assert!((a.distance_m(b) - 30.48).abs() < 1e-6);
        assert_eq!(measure(a, b, Units::Imperial), "100 ft");
    }

    #[test]
    fn test_format_miles_and_kilometers() {
        assert_eq!(format_distance(1609.344, Units::Imperial), "1.00 mi");
        assert_eq!(format_distance(2500.0, Units::Metric), "2.50 km");
        assert_eq!(format_distance(12.4, Units::Metric), "12 m");
    }

    #[test]
    fn test_format_rejects_garbage() {
        assert_eq!(format_distance(f64::NAN, Units::Metric), "0 m");
        assert_eq!(format_distance(-5.0, Units::Imperial), "0 ft");
    }

    #[test]
    fn test_screen_cache_fields_are_ignored() {
        let p: GeoPoint = serde_json::from_str(r#"{"lng":1.5,"lat":2.5,"x":10,"y":20}"#).unwrap();
        assert_eq!(p, GeoPoint::new(1.5, 2.5));
    }
}
