//! Freehand drawing tool.

use super::{PointerInput, Tool, ToolContext, ToolKey, ToolKind};
use crate::config::StyleConfig;
use crate::events::EditorEvent;
use crate::geo::GeoPoint;
use crate::painter::GeoPainter;
use crate::shapes::Shape;
use kurbo::Point;

/// Centered moving average over `window` samples.
///
/// The first and last points are kept verbatim. Near the ends the window is
/// clipped to the available samples, so it shrinks on one side only.
pub fn smooth_path(points: &[GeoPoint], window: usize) -> Vec<GeoPoint> {
    let n = points.len();
    if n <= 2 || window <= 1 {
        return points.to_vec();
    }
    let half = window / 2;
    (0..n)
        .map(|i| {
            if i == 0 || i == n - 1 {
                return points[i];
            }
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            let span = &points[lo..=hi];
            let count = span.len() as f64;
            let (lng, lat) = span
                .iter()
                .fold((0.0, 0.0), |(lng, lat), p| (lng + p.lng, lat + p.lat));
            GeoPoint::new(lng / count, lat / count)
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct FreehandTool {
    style: StyleConfig,
    samples: Vec<GeoPoint>,
    last_screen: Option<Point>,
}

impl FreehandTool {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.samples.clear();
        self.last_screen = None;
    }

    fn push_sample(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        let Some(last) = self.last_screen else {
            return false;
        };
        if (input.screen - last).hypot() < ctx.config.freehand_min_distance {
            return false;
        }
        self.samples.push(input.geo);
        self.last_screen = Some(input.screen);
        true
    }
}

impl Tool for FreehandTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Freehand
    }

    fn deactivate(&mut self) {
        self.reset();
    }

    fn update_style(&mut self, style: &StyleConfig) {
        self.style = style.clone();
    }

    fn pointer_down(&mut self, _ctx: &ToolContext, input: PointerInput) -> bool {
        self.samples.clear();
        self.samples.push(input.geo);
        self.last_screen = Some(input.screen);
        true
    }

    fn pointer_move(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        self.push_sample(ctx, input)
    }

    fn pointer_up(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        if self.last_screen.is_none() {
            return false;
        }
        self.push_sample(ctx, input);
        if self.samples.len() < 2 {
            self.reset();
            return true;
        }
        let points = smooth_path(&self.samples, ctx.config.freehand_smoothing_window);
        let shape = Shape::freehand(points).with_style(&self.style);
        log::debug!("freehand complete: {} ({} samples)", shape.id(), self.samples.len());
        ctx.bus.publish(EditorEvent::ShapeComplete(shape));
        self.reset();
        true
    }

    fn key(&mut self, _ctx: &ToolContext, key: ToolKey) -> bool {
        if key == ToolKey::Escape && self.last_screen.is_some() {
            self.reset();
            return true;
        }
        false
    }

    fn draw_overlay(&self, painter: &mut dyn GeoPainter) {
        painter.draw_line(&self.samples, self.style.line_color, self.style.line_thickness);
    }

    fn is_capturing(&self) -> bool {
        self.last_screen.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeType;
    use crate::tools::test_support::{Harness, at};

    fn g(x: f64) -> GeoPoint {
        GeoPoint::new(x, 0.0)
    }

    #[test]
    fn test_smoothing_keeps_endpoints() {
        let pts = vec![g(0.0), g(10.0), g(0.0), g(10.0), g(0.0), g(10.0)];
        let out = smooth_path(&pts, 5);
        assert_eq!(out.len(), pts.len());
        assert_eq!(out[0], pts[0]);
        assert_eq!(out[5], pts[5]);
    }

    #[test]
    fn test_smoothing_window_shrinks_at_edges() {
        let pts: Vec<GeoPoint> = [0.0, 1.0, 2.0, 3.0, 10.0, 5.0, 6.0].iter().map(|x| g(*x)).collect();
        let out = smooth_path(&pts, 5);
        // i = 1 averages indices 0..=3
        assert!((out[1].lng - 1.5).abs() < 1e-12);
        // i = 3 averages indices 1..=5
        assert!((out[3].lng - 21.0 / 5.0).abs() < 1e-12);
        // i = 5 averages indices 3..=6
        assert!((out[5].lng - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_short_paths_untouched() {
        let pts = vec![g(0.0), g(1.0)];
        assert_eq!(smooth_path(&pts, 5), pts);
        assert_eq!(smooth_path(&[], 5), Vec::<GeoPoint>::new());
    }

    #[test]
    fn test_min_distance_filter() {
        let mut h = Harness::new();
        let mut tool = FreehandTool::new();
        tool.pointer_down(&h.ctx(), at(0.0, 0.0));
        assert!(!tool.pointer_move(&h.ctx(), at(1.0, 0.0)));
        assert!(tool.pointer_move(&h.ctx(), at(5.0, 0.0)));
        assert!(tool.pointer_move(&h.ctx(), at(10.0, 0.0)));
        assert!(!tool.pointer_move(&h.ctx(), at(11.0, 1.0)));
        tool.pointer_up(&h.ctx(), at(20.0, 0.0));

        h.apply();
        assert_eq!(h.shapes.len(), 1);
        let path = &h.shapes[0];
        assert_eq!(path.shape_type(), ShapeType::Freehand);
        assert_eq!(path.points.len(), 4);
        assert_eq!(path.points[0], GeoPoint::new(0.0, 0.0));
        assert_eq!(path.points[3], GeoPoint::new(20.0, 0.0));
    }

    #[test]
    fn test_tap_yields_no_shape() {
        let mut h = Harness::new();
        let mut tool = FreehandTool::new();
        tool.pointer_down(&h.ctx(), at(0.0, 0.0));
        tool.pointer_up(&h.ctx(), at(0.5, 0.0));
        assert!(h.apply().is_empty());
        assert!(!tool.is_capturing());
    }
}
