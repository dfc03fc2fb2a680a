//! Geographic drawing primitives.
//!
//! A [`GeoPainter`] accepts geographic points, re-projects them through its
//! current projection and draws in screen pixels. The helpers below build
//! the screen-space paths the primitives share.

use crate::config::EngineConfig;
use crate::geo::GeoPoint;
use crate::projection::Projection;
use crate::shapes::{AreaStyle, HatchPattern, SerializableColor, SignData, TextData};
use kurbo::{BezPath, Point, Rect, Stroke, Vec2};

/// Drawing surface for committed shapes, selection UI and tool overlays.
pub trait GeoPainter {
    /// Projection used to convert geographic input to screen pixels.
    fn projection(&self) -> &dyn Projection;

    fn config(&self) -> &EngineConfig;

    /// Open polyline. Fewer than two points draws nothing.
    fn draw_line(&mut self, points: &[GeoPoint], color: SerializableColor, width: f64);

    /// Line with a two-wing arrowhead at `to`.
    fn draw_arrow(&mut self, from: GeoPoint, to: GeoPoint, color: SerializableColor, width: f64);

    /// Closed ring with optional fill and hatching. Fewer than three
    /// distinct vertices draws nothing.
    fn draw_polygon(
        &mut self,
        ring: &[GeoPoint],
        color: SerializableColor,
        width: f64,
        area: &AreaStyle,
    );

    /// Line with arrowheads at both ends and a white-backed label at the midpoint.
    fn draw_dimension_line(
        &mut self,
        from: GeoPoint,
        to: GeoPoint,
        label: &str,
        color: SerializableColor,
        width: f64,
    );

    /// Multi-line text block vertically centered on `anchor`.
    fn draw_text(&mut self, anchor: GeoPoint, text: &TextData);

    /// Icon centered and rotated about `anchor`.
    fn draw_sign(&mut self, anchor: GeoPoint, sign: &SignData);

    /// Stroke a path already in screen pixels.
    fn stroke_screen(&mut self, path: &BezPath, color: SerializableColor, stroke: &Stroke);

    /// Fill a path already in screen pixels.
    fn fill_screen(&mut self, path: &BezPath, color: SerializableColor);
}

/// Path through `points`, optionally closed.
pub fn polyline_path(points: &[Point], close: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        path.move_to(*first);
        for p in iter {
            path.line_to(*p);
        }
        if close {
            path.close_path();
        }
    }
    path
}

/// Two arrowhead wings at `tip`, pointing away from `tail`.
///
/// Returns an empty path when the segment has no direction.
pub fn arrowhead(tail: Point, tip: Point, length: f64, angle: f64) -> BezPath {
    let mut path = BezPath::new();
    let dir = tip - tail;
    if dir.hypot() < f64::EPSILON {
        return path;
    }
    let back = (-dir).atan2();
    for wing in [back - angle, back + angle] {
        path.move_to(tip);
        path.line_to(tip + Vec2::from_angle(wing) * length);
    }
    path
}

/// Parallel hatch lines covering `bounds`, to be clipped to the ring.
pub fn hatch_lines(bounds: Rect, pattern: HatchPattern, spacing: f64) -> BezPath {
    let mut path = BezPath::new();
    if spacing <= 0.0 || bounds.is_zero_area() {
        return path;
    }
    let center = bounds.center();
    let radius = 0.5 * bounds.width().hypot(bounds.height());
    let steps = (radius / spacing).ceil() as i64;

    for &(dx, dy) in pattern.directions() {
        let dir = Vec2::new(dx, dy);
        let normal = Vec2::new(-dy, dx);
        for i in -steps..=steps {
            let base = center + normal * (i as f64 * spacing);
            path.move_to(base - dir * radius);
            path.line_to(base + dir * radius);
        }
    }
    path
}

/// Outline of a screen rectangle.
pub fn rect_path(rect: Rect) -> BezPath {
    polyline_path(
        &[
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ],
        true,
    )
}

/// Whether a ring has at least three distinct vertices.
pub fn is_drawable_ring(ring: &[GeoPoint]) -> bool {
    let mut distinct: Vec<GeoPoint> = Vec::with_capacity(3);
    for p in ring {
        if !distinct.contains(p) {
            distinct.push(*p);
            if distinct.len() >= 3 {
                return true;
            }
        }
    }
    false
}
