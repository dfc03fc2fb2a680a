//! Screen-space hit-testing and bounds.
//!
//! Every function here is pure and never fails: "no match" is `None`.

use crate::geo::GeoPoint;
use crate::projection::Projection;
use crate::shapes::{Shape, ShapeId, ShapeKind, SignData, TextData};
use kurbo::{Affine, Point, Rect};

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Even-odd ray cast. The ring may or may not repeat its first vertex.
pub fn point_in_polygon(point: Point, ring: &[Point]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (pi, pj) = (ring[i], ring[j]);
        if (pi.y > point.y) != (pj.y > point.y) {
            let x_cross = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Axis-aligned bounds of a point set.
pub fn bounding_box(points: &[Point]) -> Option<Rect> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold(Rect::from_points(first, first), |r, p| r.union_pt(*p)),
    )
}

/// Axis-aligned bounds of `local` rotated by `degrees` and moved to `anchor`.
pub fn rotated_bounds(local: Rect, anchor: Point, degrees: f64) -> Rect {
    bounding_box(&rotated_corners(local, anchor, degrees)).unwrap_or(local)
}

/// Corners of `local` rotated by `degrees` about `anchor`, in
/// top-left, top-right, bottom-right, bottom-left order.
pub fn rotated_corners(local: Rect, anchor: Point, degrees: f64) -> [Point; 4] {
    let xf = Affine::translate(anchor.to_vec2()) * Affine::rotate(degrees.to_radians());
    [
        xf * Point::new(local.x0, local.y0),
        xf * Point::new(local.x1, local.y0),
        xf * Point::new(local.x1, local.y1),
        xf * Point::new(local.x0, local.y1),
    ]
}

/// Whether `point` lies inside `local` rotated by `degrees` about `anchor`.
pub fn rotated_contains(local: Rect, anchor: Point, degrees: f64, point: Point) -> bool {
    let back = Affine::rotate(-degrees.to_radians()) * Point::new(point.x - anchor.x, point.y - anchor.y);
    local.contains(back)
}

/// Screen bounds of a text block anchored at `anchor`.
pub fn text_bounds(anchor: Point, text: &TextData) -> Rect {
    rotated_bounds(text.local_bounds(), anchor, text.rotation)
}

/// Unrotated square of a sign, centered on the origin.
pub fn sign_local_bounds(sign: &SignData) -> Rect {
    let half = sign.size / 2.0;
    Rect::new(-half, -half, half, half)
}

/// Screen bounds of a sign centered at `anchor`.
pub fn sign_bounds(anchor: Point, sign: &SignData) -> Rect {
    rotated_bounds(sign_local_bounds(sign), anchor, sign.rotation)
}

/// Project geographic points to screen pixels.
pub fn project_points(projection: &dyn Projection, points: &[GeoPoint]) -> Vec<Point> {
    points.iter().map(|p| projection.project(*p)).collect()
}

/// Screen bounds of a shape, including text and sign extents.
pub fn shape_screen_bounds(shape: &Shape, projection: &dyn Projection) -> Option<Rect> {
    match shape.kind() {
        ShapeKind::Text(t) => Some(text_bounds(projection.project(shape.anchor()?), t)),
        ShapeKind::Sign { sign_data } => Some(sign_bounds(projection.project(shape.anchor()?), sign_data)),
        _ => bounding_box(&project_points(projection, &shape.points)),
    }
}

/// Screen-space center used for rotation and scaling about a shape.
pub fn shape_screen_center(shape: &Shape, projection: &dyn Projection) -> Option<Point> {
    match shape.anchor() {
        Some(anchor) => Some(projection.project(anchor)),
        None => shape_screen_bounds(shape, projection).map(|r| r.center()),
    }
}

/// Per-type distance from a screen point to a shape.
///
/// Zero inside a ring or a label/icon box; otherwise nearest-segment
/// distance for line-like shapes and ring outlines, and center distance for
/// text and signs.
pub fn shape_distance(shape: &Shape, projection: &dyn Projection, point: Point) -> Option<f64> {
    if shape.points.is_empty() {
        return None;
    }
    match shape.kind() {
        ShapeKind::Line | ShapeKind::Arrow | ShapeKind::Dimension { .. } | ShapeKind::Freehand => {
            Some(point_to_polyline_dist(point, &project_points(projection, &shape.points)))
        }
        ShapeKind::Rectangle(_) | ShapeKind::Polygon(_) => {
            let ring = project_points(projection, &shape.points);
            if point_in_polygon(point, &ring) {
                Some(0.0)
            } else {
                Some(point_to_polyline_dist(point, &ring))
            }
        }
        ShapeKind::Text(t) => {
            let anchor = projection.project(shape.anchor()?);
            if rotated_contains(t.local_bounds(), anchor, t.rotation, point) {
                Some(0.0)
            } else {
                Some((point - anchor).hypot())
            }
        }
        ShapeKind::Sign { sign_data } => {
            let anchor = projection.project(shape.anchor()?);
            if rotated_contains(sign_local_bounds(sign_data), anchor, sign_data.rotation, point) {
                Some(0.0)
            } else {
                Some((point - anchor).hypot())
            }
        }
    }
}

/// Nearest shape within `threshold` pixels; ties go to the earliest in the list.
pub fn nearest_shape(
    shapes: &[Shape],
    projection: &dyn Projection,
    point: Point,
    threshold: f64,
) -> Option<ShapeId> {
    let mut best: Option<(ShapeId, f64)> = None;
    for shape in shapes {
        let Some(d) = shape_distance(shape, projection, point) else {
            continue;
        };
        if d > threshold {
            continue;
        }
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((shape.id(), d));
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{AreaStyle, SerializableColor};
    use crate::test_util::{Identity, g};

    #[test]
    fn test_segment_distance() {
        let d = point_to_segment_dist(Point::new(5.0, 5.0), Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!((d - 5.0).abs() < f64::EPSILON);
        // beyond the end clamps to the endpoint
        let d = point_to_segment_dist(Point::new(13.0, 4.0), Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-12);
        // degenerate segment
        let d = point_to_segment_dist(Point::new(3.0, 4.0), Point::ZERO, Point::ZERO);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(0.0, 0.0),
        ];
        assert!(point_in_polygon(Point::new(5.0, 5.0), &square));
        assert!(!point_in_polygon(Point::new(15.0, 5.0), &square));
        assert!(!point_in_polygon(Point::new(5.0, 5.0), &square[..2]));
    }

    #[test]
    fn test_rotated_bounds_grow() {
        let local = Rect::new(-10.0, -10.0, 10.0, 10.0);
        let r = rotated_bounds(local, Point::new(100.0, 100.0), 45.0);
        let half = 10.0 * std::f64::consts::SQRT_2;
        assert!((r.width() - 2.0 * half).abs() < 1e-9);
        assert!((r.center().x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_inside_area_is_zero_distance() {
        let rect = Shape::rectangle([g(0.0, 0.0), g(10.0, 0.0), g(10.0, 10.0), g(0.0, 10.0)], AreaStyle::default());
        assert_eq!(shape_distance(&rect, &Identity, Point::new(5.0, 5.0)), Some(0.0));
        let d = shape_distance(&rect, &Identity, Point::new(13.0, 5.0)).unwrap();
        assert!((d - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_text_uses_center_distance_outside_box() {
        let text = Shape::text(g(100.0, 100.0), TextData::new("hi", 10.0, SerializableColor::black()));
        assert_eq!(shape_distance(&text, &Identity, Point::new(101.0, 100.0)), Some(0.0));
        let d = shape_distance(&text, &Identity, Point::new(100.0, 130.0)).unwrap();
        assert!((d - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_shape_threshold_and_ties() {
        let a = Shape::line(g(0.0, 0.0), g(100.0, 0.0));
        let b = Shape::line(g(0.0, 10.0), g(100.0, 10.0));
        let shapes = vec![a.clone(), b.clone()];

        assert_eq!(nearest_shape(&shapes, &Identity, Point::new(50.0, 2.0), 10.0), Some(a.id()));
        assert_eq!(nearest_shape(&shapes, &Identity, Point::new(50.0, 8.0), 10.0), Some(b.id()));
        // equidistant: first in list wins
        assert_eq!(nearest_shape(&shapes, &Identity, Point::new(50.0, 5.0), 10.0), Some(a.id()));
        assert_eq!(nearest_shape(&shapes, &Identity, Point::new(50.0, 40.0), 10.0), None);
        assert_eq!(nearest_shape(&[], &Identity, Point::ZERO, 10.0), None);
    }
}
