//! Selection handles, handle hit-testing and manipulation.
//!
//! Handles live in screen space. Manipulations are computed in screen space
//! against the shape as it was when the handle was grabbed, then
//! unprojected back to geographic points.

use crate::config::EngineConfig;
use crate::geo::GeoPoint;
use crate::geometry::{
    bounding_box, project_points, rotated_corners, shape_screen_bounds, sign_local_bounds,
};
use crate::painter::{GeoPainter, polyline_path, rect_path};
use crate::projection::Projection;
use crate::shapes::{Shape, ShapeKind, clamp_size, normalize_rotation};
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape as _, Stroke, Vec2};

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn opposite(self) -> Self {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    fn of(self, rect: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(rect.x0, rect.y0),
            Corner::TopRight => Point::new(rect.x1, rect.y0),
            Corner::BottomLeft => Point::new(rect.x0, rect.y1),
            Corner::BottomRight => Point::new(rect.x1, rect.y1),
        }
    }
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// Bounding-box corner of a rectangle, freehand path, text or sign.
    Corner(Corner),
    /// Index into the shape's points (ring vertex or line endpoint).
    Vertex(usize),
    /// Rotation handle above a text label or sign.
    Rotate,
}

/// How a handle is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleShape {
    Square,
    Circle,
}

/// A selection handle with its screen position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in screen pixels.
    pub position: Point,
    pub kind: HandleKind,
    pub shape: HandleShape,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind, shape: HandleShape) -> Self {
        Self {
            position,
            kind,
            shape,
        }
    }

    /// Check if a screen point is within `tolerance` of this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        let dist_sq = dx * dx + dy * dy;
        dist_sq <= tolerance * tolerance
    }
}

/// Unrotated box and rotation of a text label or sign.
fn label_frame(shape: &Shape, projection: &dyn Projection) -> Option<(Rect, Point, f64)> {
    let anchor = projection.project(shape.anchor()?);
    match shape.kind() {
        ShapeKind::Text(t) => Some((t.local_bounds(), anchor, t.rotation)),
        ShapeKind::Sign { sign_data } => {
            Some((sign_local_bounds(sign_data), anchor, sign_data.rotation))
        }
        _ => None,
    }
}

/// Rotate-handle position and the top-center it hangs from.
fn rotate_handle_position(
    local: Rect,
    anchor: Point,
    rotation: f64,
    offset: f64,
) -> (Point, Point) {
    let xf = Affine::translate(anchor.to_vec2()) * Affine::rotate(rotation.to_radians());
    let top = xf * Point::new(local.center().x, local.y0);
    let handle = xf * Point::new(local.center().x, local.y0 - offset);
    (handle, top)
}

/// Get the selection handles for a shape, in screen space.
pub fn get_handles(shape: &Shape, projection: &dyn Projection, config: &EngineConfig) -> Vec<Handle> {
    match shape.kind() {
        ShapeKind::Rectangle(_) | ShapeKind::Freehand => {
            let Some(bounds) = bounding_box(&project_points(projection, &shape.points)) else {
                return Vec::new();
            };
            [Corner::TopLeft, Corner::TopRight, Corner::BottomLeft, Corner::BottomRight]
                .into_iter()
                .map(|c| Handle::new(c.of(bounds), HandleKind::Corner(c), HandleShape::Square))
                .collect()
        }
        ShapeKind::Text(_) | ShapeKind::Sign { .. } => {
            let Some((local, anchor, rotation)) = label_frame(shape, projection) else {
                return Vec::new();
            };
            let [tl, tr, br, bl] = rotated_corners(local, anchor, rotation);
            let (rotate, _) =
                rotate_handle_position(local, anchor, rotation, config.rotate_handle_offset);
            vec![
                Handle::new(tl, HandleKind::Corner(Corner::TopLeft), HandleShape::Square),
                Handle::new(tr, HandleKind::Corner(Corner::TopRight), HandleShape::Square),
                Handle::new(bl, HandleKind::Corner(Corner::BottomLeft), HandleShape::Square),
                Handle::new(br, HandleKind::Corner(Corner::BottomRight), HandleShape::Square),
                Handle::new(rotate, HandleKind::Rotate, HandleShape::Circle),
            ]
        }
        ShapeKind::Polygon(_)
        | ShapeKind::Line
        | ShapeKind::Arrow
        | ShapeKind::Dimension { .. } => shape
            .ring_vertices()
            .iter()
            .enumerate()
            .map(|(i, p)| Handle::new(projection.project(*p), HandleKind::Vertex(i), HandleShape::Circle))
            .collect(),
    }
}

/// Find which handle (if any) is hit; the closest wins when several are.
pub fn hit_test_handles(
    shape: &Shape,
    projection: &dyn Projection,
    config: &EngineConfig,
    point: Point,
) -> Option<HandleKind> {
    get_handles(shape, projection, config)
        .into_iter()
        .filter(|h| h.hit_test(point, config.handle_tolerance))
        .min_by(|a, b| {
            let da = (a.position - point).hypot2();
            let db = (b.position - point).hypot2();
            da.total_cmp(&db)
        })
        .map(|h| h.kind)
}

/// Draw the dashed outline, rotate stub and handles of a selected shape.
pub fn render_selection(shape: &Shape, painter: &mut dyn GeoPainter) {
    let config = painter.config().clone();
    let color = config.selection_color;
    let dashed = Stroke::new(1.0).with_dashes(0.0, [5.0, 5.0]);

    let outline = match label_frame(shape, painter.projection()) {
        Some((local, anchor, rotation)) => {
            let (handle, top) =
                rotate_handle_position(local, anchor, rotation, config.rotate_handle_offset);
            let stub = polyline_path(&[top, handle], false);
            painter.stroke_screen(&stub, color, &Stroke::new(1.0));
            Some(polyline_path(&rotated_corners(local, anchor, rotation), true))
        }
        None => shape_screen_bounds(shape, painter.projection()).map(|b| rect_path(b.inflate(4.0, 4.0))),
    };
    if let Some(outline) = outline {
        painter.stroke_screen(&outline, color, &dashed);
    }

    let half = config.handle_size / 2.0;
    for handle in get_handles(shape, painter.projection(), &config) {
        let path: BezPath = match handle.shape {
            HandleShape::Square => rect_path(Rect::from_center_size(
                handle.position,
                (config.handle_size, config.handle_size),
            )),
            HandleShape::Circle => Circle::new(handle.position, half).to_path(0.1),
        };
        painter.fill_screen(&path, crate::shapes::SerializableColor::white());
        painter.stroke_screen(&path, color, &Stroke::new(1.5));
    }
}

/// Translate the grabbed shape by a geographic delta.
pub fn apply_drag(original: &Shape, grab: GeoPoint, current: GeoPoint, config: &EngineConfig) -> Shape {
    let (d_lng, d_lat) = current.delta_from(grab);
    let mut shape = original.clone();
    shape.translate(d_lng, d_lat);
    shape.refresh_measurement(config.units);
    shape
}

/// Apply a handle drag from `grab` to `current` (screen pixels) to the
/// shape as it was at grab time.
///
/// Returns `None` when the manipulation is degenerate for this frame.
pub fn apply_handle(
    original: &Shape,
    handle: HandleKind,
    grab: Point,
    current: Point,
    projection: &dyn Projection,
    config: &EngineConfig,
) -> Option<Shape> {
    let mut shape = original.clone();
    match (handle, original.kind()) {
        (HandleKind::Corner(corner), ShapeKind::Rectangle(_) | ShapeKind::Freehand) => {
            apply_corner_resize(&mut shape, corner, current - grab, projection)?;
        }
        (HandleKind::Corner(_), ShapeKind::Text(_) | ShapeKind::Sign { .. }) => {
            let center = projection.project(original.anchor()?);
            let grab_dist = (grab - center).hypot();
            if grab_dist < f64::EPSILON {
                return None;
            }
            let ratio = (current - center).hypot() / grab_dist;
            if let Some(sign) = shape.sign_data_mut() {
                sign.size = clamp_size(sign.size * ratio, config.sign_min_size, config.sign_max_size);
            } else if let Some(text) = shape.text_data_mut() {
                text.size = clamp_size(text.size * ratio, config.text_min_size, config.text_max_size);
            }
        }
        (HandleKind::Vertex(i), _) => {
            let vertex = *original.points.get(i)?;
            let moved = projection.unproject(projection.project(vertex) + (current - grab));
            let last = shape.points.len() - 1;
            shape.points[i] = moved;
            if shape.is_ring() && i == 0 && last > 0 {
                shape.points[last] = moved;
            }
            shape.refresh_measurement(config.units);
        }
        (HandleKind::Rotate, ShapeKind::Text(_) | ShapeKind::Sign { .. }) => {
            let center = projection.project(original.anchor()?);
            let from = grab - center;
            let to = current - center;
            if from.hypot() < f64::EPSILON || to.hypot() < f64::EPSILON {
                return None;
            }
            let delta = (to.atan2() - from.atan2()).to_degrees();
            shape.set_rotation(normalize_rotation(original.rotation()? + delta));
        }
        _ => return None,
    }
    Some(shape)
}

/// Scale every point about the corner opposite the dragged one.
fn apply_corner_resize(
    shape: &mut Shape,
    corner: Corner,
    delta: Vec2,
    projection: &dyn Projection,
) -> Option<()> {
    let screen = project_points(projection, &shape.points);
    let bounds = bounding_box(&screen)?;
    let fixed = corner.opposite().of(bounds);
    let old = corner.of(bounds) - fixed;
    let new = old + delta;
    if old.x.abs() < f64::EPSILON || old.y.abs() < f64::EPSILON {
        return None;
    }
    if new.x.abs() < f64::EPSILON || new.y.abs() < f64::EPSILON {
        return None;
    }
    let (scale_x, scale_y) = (new.x / old.x, new.y / old.y);

    for (point, s) in shape.points.iter_mut().zip(screen) {
        let scaled = Point::new(
            fixed.x + (s.x - fixed.x) * scale_x,
            fixed.y + (s.y - fixed.y) * scale_y,
        );
        *point = projection.unproject(scaled);
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Units;
    use crate::shapes::{AreaStyle, SerializableColor, SignData, TextData};
    use crate::test_util::{Identity, g};

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn square() -> Shape {
        Shape::rectangle(
            [g(0.0, 0.0), g(100.0, 0.0), g(100.0, 100.0), g(0.0, 100.0)],
            AreaStyle::default(),
        )
    }

    fn sign(size: f64) -> Shape {
        Shape::sign(g(200.0, 200.0), SignData::new("stop.png", "Stop", size))
    }

    #[test]
    fn test_line_handles() {
        let line = Shape::line(g(0.0, 0.0), g(100.0, 100.0));
        let handles = get_handles(&line, &Identity, &config());
        assert_eq!(handles.len(), 2);
        assert!(matches!(handles[0].kind, HandleKind::Vertex(0)));
        assert!(handles.iter().all(|h| h.shape == HandleShape::Circle));
    }

    #[test]
    fn test_polygon_handles_skip_closing_vertex() {
        let poly = Shape::polygon(vec![g(0.0, 0.0), g(10.0, 0.0), g(10.0, 10.0)], AreaStyle::default());
        assert_eq!(get_handles(&poly, &Identity, &config()).len(), 3);
    }

    #[test]
    fn test_rectangle_handles() {
        let handles = get_handles(&square(), &Identity, &config());
        assert_eq!(handles.len(), 4);
        assert!(handles.iter().all(|h| h.shape == HandleShape::Square));
        assert!(!handles.iter().any(|h| h.kind == HandleKind::Rotate));
    }

    #[test]
    fn test_sign_rotate_handle_above_top_center() {
        let handles = get_handles(&sign(64.0), &Identity, &config());
        assert_eq!(handles.len(), 5);
        let rotate = handles.iter().find(|h| h.kind == HandleKind::Rotate).unwrap();
        assert!((rotate.position.x - 200.0).abs() < 1e-9);
        assert!((rotate.position.y - (200.0 - 32.0 - 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_handle_hit_test() {
        let handle = Handle::new(Point::new(50.0, 50.0), HandleKind::Vertex(0), HandleShape::Circle);
        let tol = config().handle_tolerance;
        assert!(handle.hit_test(Point::new(50.0, 50.0), tol));
        assert!(handle.hit_test(Point::new(50.0 + tol, 50.0), tol));
        assert!(!handle.hit_test(Point::new(50.0 + tol + 1e-6, 50.0), tol));
    }

    #[test]
    fn test_hit_test_handles_prefers_closest() {
        let line = Shape::line(g(0.0, 0.0), g(6.0, 0.0));
        let hit = hit_test_handles(&line, &Identity, &config(), Point::new(5.0, 0.0));
        assert_eq!(hit, Some(HandleKind::Vertex(1)));
        assert_eq!(hit_test_handles(&line, &Identity, &config(), Point::new(50.0, 50.0)), None);
    }

    #[test]
    fn test_corner_resize_rectangle() {
        let shape = square();
        let out = apply_handle(
            &shape,
            HandleKind::Corner(Corner::BottomRight),
            Point::new(100.0, 100.0),
            Point::new(150.0, 150.0),
            &Identity,
            &config(),
        )
        .unwrap();
        let b = bounding_box(&project_points(&Identity, &out.points)).unwrap();
        assert!((b.width() - 150.0).abs() < 1e-9);
        assert!((b.height() - 150.0).abs() < 1e-9);
        assert_eq!(out.points.first(), out.points.last());
        assert_eq!(out.id(), shape.id());
    }

    #[test]
    fn test_corner_resize_to_zero_area_is_noop() {
        let out = apply_handle(
            &square(),
            HandleKind::Corner(Corner::BottomRight),
            Point::new(100.0, 100.0),
            Point::new(0.0, 150.0),
            &Identity,
            &config(),
        );
        assert!(out.is_none());
    }

    #[test]
    fn test_freehand_resize() {
        let shape = Shape::freehand(vec![g(0.0, 0.0), g(50.0, 0.0), g(50.0, 50.0), g(0.0, 50.0)]);
        let out = apply_handle(
            &shape,
            HandleKind::Corner(Corner::BottomRight),
            Point::new(50.0, 50.0),
            Point::new(100.0, 100.0),
            &Identity,
            &config(),
        )
        .unwrap();
        let b = bounding_box(&project_points(&Identity, &out.points)).unwrap();
        assert!((b.width() - 100.0).abs() < 0.1);
        assert!((b.height() - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_sign_resize_clamps() {
        let cfg = config();
        let shape = sign(250.0);
        let grab = Point::new(200.0 + 125.0, 200.0 + 125.0);
        for far in [400.0, 1_000.0, 10_000.0] {
            let out = apply_handle(&shape, HandleKind::Corner(Corner::BottomRight), grab, Point::new(far, far), &Identity, &cfg).unwrap();
            let size = out.sign_data().unwrap().size;
            assert!(size <= 256.0 && size >= 250.0);
        }
        for near in [201.0, 210.0, 230.0] {
            let out = apply_handle(&shape, HandleKind::Corner(Corner::BottomRight), grab, Point::new(near, near), &Identity, &cfg).unwrap();
            assert!(out.sign_data().unwrap().size >= 32.0);
        }
    }

    #[test]
    fn test_text_resize_uses_text_range() {
        let shape = Shape::text(g(0.0, 0.0), TextData::new("label", 20.0, SerializableColor::black()));
        let out = apply_handle(
            &shape,
            HandleKind::Corner(Corner::TopLeft),
            Point::new(10.0, 0.0),
            Point::new(1.0, 0.0),
            &Identity,
            &config(),
        )
        .unwrap();
        assert!((out.text_data().unwrap().size - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_adds_angle_delta() {
        let shape = sign(64.0);
        // grab straight above the center, drag to the right: +90 degrees
        let out = apply_handle(
            &shape,
            HandleKind::Rotate,
            Point::new(200.0, 100.0),
            Point::new(300.0, 200.0),
            &Identity,
            &config(),
        )
        .unwrap();
        assert!((out.rotation().unwrap() - 90.0).abs() < 1e-9);

        let back = apply_handle(
            &shape,
            HandleKind::Rotate,
            Point::new(200.0, 100.0),
            Point::new(100.0, 200.0),
            &Identity,
            &config(),
        )
        .unwrap();
        assert!((back.rotation().unwrap() - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_ignored_for_line() {
        let line = Shape::line(g(0.0, 0.0), g(10.0, 0.0));
        let out = apply_handle(&line, HandleKind::Rotate, Point::ZERO, Point::new(5.0, 5.0), &Identity, &config());
        assert!(out.is_none());
    }

    #[test]
    fn test_polygon_first_vertex_moves_closing_copy() {
        let poly = Shape::polygon(vec![g(0.0, 0.0), g(10.0, 0.0), g(10.0, 10.0)], AreaStyle::default());
        let out = apply_handle(&poly, HandleKind::Vertex(0), Point::ZERO, Point::new(-5.0, -5.0), &Identity, &config()).unwrap();
        assert_eq!(out.points[0], g(-5.0, -5.0));
        assert_eq!(out.points[3], g(-5.0, -5.0));
    }

    #[test]
    fn test_dimension_endpoint_refreshes_measurement() {
        let cfg = EngineConfig {
            units: Units::Metric,
            ..EngineConfig::default()
        };
        let mercator = crate::projection::MercatorViewport::new(g(0.0, 0.0), 16.0, kurbo::Size::new(800.0, 600.0));
        let dim = Shape::dimension(g(0.0, 0.0), g(0.0, 0.0), Units::Metric);
        let grab = mercator.project(g(0.0, 0.0));
        let out = apply_handle(&dim, HandleKind::Vertex(1), grab, grab + Vec2::new(0.0, -100.0), &mercator, &cfg).unwrap();
        assert_ne!(out.measurement(), Some("0 m"));
    }

    #[test]
    fn test_drag_translates_in_geo_space() {
        let line = Shape::line(g(-118.24, 34.05), g(-118.23, 34.06));
        let out = apply_drag(&line, g(-118.235, 34.055), g(-118.234, 34.056), &config());
        assert!((out.points[0].lng - -118.239).abs() < 1e-9);
        assert!((out.points[0].lat - 34.051).abs() < 1e-9);
        assert_eq!(out.id(), line.id());
    }
}
