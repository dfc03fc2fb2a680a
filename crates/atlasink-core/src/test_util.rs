//! Shared fixtures for unit tests.

use crate::geo::GeoPoint;
use crate::projection::Projection;
use kurbo::Point;

/// Maps lng/lat straight to x/y, so tests can reason in pixels.
pub struct Identity;

impl Projection for Identity {
    fn project(&self, geo: GeoPoint) -> Point {
        Point::new(geo.lng, geo.lat)
    }

    fn unproject(&self, screen: Point) -> GeoPoint {
        GeoPoint::new(screen.x, screen.y)
    }

    fn center(&self) -> GeoPoint {
        GeoPoint::default()
    }
}

pub fn g(x: f64, y: f64) -> GeoPoint {
    GeoPoint::new(x, y)
}
