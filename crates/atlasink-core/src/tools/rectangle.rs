//! Rectangle tool.
//!
//! Corners are laid out in screen space and unprojected one by one, so the
//! rectangle looks square on screen whatever the map bearing.

use super::{PointerInput, Tool, ToolContext, ToolKey, ToolKind};
use crate::config::StyleConfig;
use crate::events::EditorEvent;
use crate::painter::{GeoPainter, polyline_path};
use crate::shapes::{AreaStyle, Shape};
use kurbo::Point;

/// The four screen corners of the axis-aligned box spanned by `a` and `b`,
/// starting at `a` and going round.
pub fn screen_rect_corners(a: Point, b: Point) -> [Point; 4] {
    [a, Point::new(b.x, a.y), b, Point::new(a.x, b.y)]
}

#[derive(Debug, Default)]
pub struct RectangleTool {
    style: StyleConfig,
    anchor: Option<Point>,
    current: Option<Point>,
    pressed: bool,
    dragged: bool,
}

impl RectangleTool {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.anchor = None;
        self.current = None;
        self.pressed = false;
        self.dragged = false;
    }

    fn complete(&mut self, ctx: &ToolContext, corner: Point) -> bool {
        let Some(anchor) = self.anchor else {
            return false;
        };
        if (corner.x - anchor.x).abs() < 1.0 || (corner.y - anchor.y).abs() < 1.0 {
            return false;
        }
        let corners = screen_rect_corners(anchor, corner).map(|p| ctx.projection.unproject(p));
        let area = AreaStyle::new(self.style.fill_color, self.style.hatch_pattern);
        let shape = Shape::rectangle(corners, area).with_style(&self.style);
        log::debug!("rectangle complete: {}", shape.id());
        ctx.bus.publish(EditorEvent::ShapeComplete(shape));
        self.reset();
        true
    }
}

impl Tool for RectangleTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Rectangle
    }

    fn deactivate(&mut self) {
        self.reset();
    }

    fn update_style(&mut self, style: &StyleConfig) {
        self.style = style.clone();
    }

    fn pointer_down(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        if self.anchor.is_some() {
            return self.complete(ctx, input.screen);
        }
        self.anchor = Some(input.screen);
        self.current = Some(input.screen);
        self.pressed = true;
        self.dragged = false;
        true
    }

    fn pointer_move(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        let Some(anchor) = self.anchor else {
            return false;
        };
        if self.pressed && (input.screen - anchor).hypot() >= ctx.config.drag_threshold {
            self.dragged = true;
        }
        self.current = Some(input.screen);
        true
    }

    fn pointer_up(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        let was_pressed = std::mem::replace(&mut self.pressed, false);
        if was_pressed && self.dragged {
            return self.complete(ctx, input.screen);
        }
        false
    }

    fn key(&mut self, _ctx: &ToolContext, key: ToolKey) -> bool {
        if key == ToolKey::Escape && self.anchor.is_some() {
            self.reset();
            return true;
        }
        false
    }

    fn draw_overlay(&self, painter: &mut dyn GeoPainter) {
        let (Some(anchor), Some(current)) = (self.anchor, self.current) else {
            return;
        };
        let corners = screen_rect_corners(anchor, current);
        let path = polyline_path(&corners, true);
        if let Some(fill) = self.style.fill_color {
            painter.fill_screen(&path, fill);
        }
        painter.stroke_screen(
            &path,
            self.style.line_color,
            &kurbo::Stroke::new(self.style.line_thickness),
        );
    }

    fn is_capturing(&self) -> bool {
        self.anchor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::shapes::ShapeType;
    use crate::tools::test_support::{Harness, at};

    #[test]
    fn test_click_click_completes() {
        let mut h = Harness::new();
        let mut tool = RectangleTool::new();
        tool.pointer_down(&h.ctx(), at(10.0, 10.0));
        tool.pointer_up(&h.ctx(), at(10.0, 10.0));
        tool.pointer_move(&h.ctx(), at(60.0, 40.0));
        tool.pointer_down(&h.ctx(), at(60.0, 40.0));

        let events = h.apply();
        assert_eq!(events.len(), 1);
        let rect = &h.shapes[0];
        assert_eq!(rect.shape_type(), ShapeType::Rectangle);
        assert_eq!(rect.points.len(), 5);
        assert_eq!(rect.points[0], rect.points[4]);
        assert_eq!(rect.points[2], GeoPoint::new(60.0, 40.0));
    }

    #[test]
    fn test_degenerate_drag_is_ignored() {
        let mut h = Harness::new();
        let mut tool = RectangleTool::new();
        tool.pointer_down(&h.ctx(), at(10.0, 10.0));
        tool.pointer_move(&h.ctx(), at(10.5, 80.0));
        tool.pointer_up(&h.ctx(), at(10.5, 80.0));
        assert!(h.apply().is_empty());
    }

    #[test]
    fn test_corners_form_right_angles() {
        let c = screen_rect_corners(Point::new(3.0, 4.0), Point::new(-20.0, 17.0));
        for i in 0..4 {
            let a = c[(i + 3) % 4] - c[i];
            let b = c[(i + 1) % 4] - c[i];
            assert!(a.dot(b).abs() < 1e-9);
        }
    }
}
