//! Map projection between geographic coordinates and screen pixels.

use crate::geo::GeoPoint;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Edge length of the world at zoom 0, in pixels.
pub const TILE_SIZE: f64 = 512.0;

/// Latitude limit of the Web-Mercator square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Conversion between geographic coordinates and screen pixels for the
/// current viewport.
pub trait Projection {
    /// Geographic point to screen pixel.
    fn project(&self, geo: GeoPoint) -> Point;

    /// Screen pixel to geographic point.
    fn unproject(&self, screen: Point) -> GeoPoint;

    /// Geographic point at the center of the viewport.
    fn center(&self) -> GeoPoint;
}

impl<P: Projection + ?Sized> Projection for &P {
    fn project(&self, geo: GeoPoint) -> Point {
        (**self).project(geo)
    }

    fn unproject(&self, screen: Point) -> GeoPoint {
        (**self).unproject(screen)
    }

    fn center(&self) -> GeoPoint {
        (**self).center()
    }
}

/// A projection the editor is allowed to move.
pub trait MapView: Projection {
    /// Move the viewport so `center` sits in the middle of the screen.
    fn recenter(&mut self, center: GeoPoint);

    /// Resize the viewport in CSS pixels.
    fn resize(&mut self, size: Size);
}

/// Web-Mercator viewport with pan, zoom and bearing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MercatorViewport {
    center: GeoPoint,
    /// Zoom level; the world is `TILE_SIZE * 2^zoom` pixels wide.
    pub zoom: f64,
    /// Clockwise map rotation in degrees.
    bearing: f64,
    size: Size,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for MercatorViewport {
    fn default() -> Self {
        Self::new(GeoPoint::default(), 0.0, Size::new(800.0, 600.0))
    }
}

impl MercatorViewport {
    pub fn new(center: GeoPoint, zoom: f64, size: Size) -> Self {
        Self {
            center: clamp_geo(center),
            zoom: zoom.clamp(0.0, 24.0),
            bearing: 0.0,
            size,
            min_zoom: 0.0,
            max_zoom: 24.0,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn bearing(&self) -> f64 {
        self.bearing
    }

    /// Set the map rotation in degrees.
    pub fn set_bearing(&mut self, degrees: f64) {
        self.bearing = crate::shapes::normalize_rotation(degrees);
    }

    pub fn set_center(&mut self, center: GeoPoint) {
        self.center = clamp_geo(center);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.min(self.max_zoom).max(self.min_zoom);
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    /// Geographic point to unrotated world pixels at the current zoom.
    fn to_world(&self, geo: GeoPoint) -> Point {
        let ws = self.world_size();
        let lat = geo.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (geo.lng + 180.0) / 360.0 * ws;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * ws;
        Point::new(x, y)
    }

    fn from_world(&self, world: Point) -> GeoPoint {
        let ws = self.world_size();
        let lng = world.x / ws * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * world.y / ws)).sinh().atan().to_degrees();
        GeoPoint::new(lng, lat)
    }

    /// World-to-screen transform.
    pub fn transform(&self) -> Affine {
        let c = self.to_world(self.center);
        Affine::translate(Vec2::new(self.size.width / 2.0, self.size.height / 2.0))
            * Affine::rotate(-self.bearing.to_radians())
            * Affine::translate(-c.to_vec2())
    }

    fn screen_center(&self) -> Point {
        Point::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    /// Move the map content by a screen delta.
    pub fn pan_by_screen(&mut self, delta: Vec2) {
        let target = self.screen_center() - delta;
        self.center = clamp_geo(self.unproject(target));
    }

    /// Zoom by `factor`, keeping the geographic point under `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let new_zoom = (self.zoom + factor.log2()).min(self.max_zoom).max(self.min_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let geo = self.unproject(screen_point);
        self.zoom = new_zoom;

        // Adjust center so geo stays at screen_point
        let drifted = self.project(geo);
        self.pan_by_screen(screen_point - drifted);
    }

    /// Center and zoom so that all points fit with `padding` pixels to spare.
    pub fn fit_to(&mut self, points: &[GeoPoint], padding: f64) {
        let Some(first) = points.first() else {
            return;
        };
        let start = self.to_world(*first);
        let bounds = points
            .iter()
            .fold(Rect::from_points(start, start), |r, p| r.union_pt(self.to_world(*p)));
        let center = self.from_world(bounds.center());

        if bounds.width() > f64::EPSILON || bounds.height() > f64::EPSILON {
            let avail_w = (self.size.width - padding * 2.0).max(1.0);
            let avail_h = (self.size.height - padding * 2.0).max(1.0);
            let scale_x = avail_w / bounds.width().max(f64::EPSILON);
            let scale_y = avail_h / bounds.height().max(f64::EPSILON);
            self.set_zoom(self.zoom + scale_x.min(scale_y).log2());
        }
        self.set_center(center);
    }
}

impl Projection for MercatorViewport {
    fn project(&self, geo: GeoPoint) -> Point {
        self.transform() * self.to_world(geo)
    }

    fn unproject(&self, screen: Point) -> GeoPoint {
        self.from_world(self.transform().inverse() * screen)
    }

    fn center(&self) -> GeoPoint {
        self.center
    }
}

impl MapView for MercatorViewport {
    fn recenter(&mut self, center: GeoPoint) {
        self.set_center(center);
    }

    fn resize(&mut self, size: Size) {
        self.size = size;
    }
}

fn clamp_geo(geo: GeoPoint) -> GeoPoint {
    GeoPoint::new(geo.lng, geo.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE))
}
