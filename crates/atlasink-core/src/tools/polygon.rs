//! Polygon tool: click to append vertices, double-click or Enter to close.

use super::{PointerInput, Tool, ToolContext, ToolKey, ToolKind};
use crate::config::StyleConfig;
use crate::events::EditorEvent;
use crate::geo::GeoPoint;
use crate::painter::GeoPainter;
use crate::shapes::{AreaStyle, Shape};

/// Trailing vertices closer than this (screen pixels) are treated as the
/// duplicate clicks of a double-click.
const DUPLICATE_VERTEX_PX: f64 = 3.0;

#[derive(Debug, Default)]
pub struct PolygonTool {
    style: StyleConfig,
    vertices: Vec<GeoPoint>,
    cursor: Option<GeoPoint>,
}

impl PolygonTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[GeoPoint] {
        &self.vertices
    }

    fn reset(&mut self) {
        self.vertices.clear();
        self.cursor = None;
    }

    fn drop_duplicate_tail(&mut self, ctx: &ToolContext) {
        while self.vertices.len() >= 2 {
            let n = self.vertices.len();
            let a = ctx.projection.project(self.vertices[n - 2]);
            let b = ctx.projection.project(self.vertices[n - 1]);
            let d = (a - b).hypot();
            if d >= DUPLICATE_VERTEX_PX {
                break;
            }
            self.vertices.pop();
        }
    }

    fn complete(&mut self, ctx: &ToolContext) -> bool {
        self.drop_duplicate_tail(ctx);
        if self.vertices.len() < 3 {
            return false;
        }
        let area = AreaStyle::new(self.style.fill_color, self.style.hatch_pattern);
        let shape = Shape::polygon(std::mem::take(&mut self.vertices), area).with_style(&self.style);
        log::debug!("polygon complete: {} ({} points)", shape.id(), shape.points.len());
        ctx.bus.publish(EditorEvent::ShapeComplete(shape));
        self.reset();
        true
    }
}

impl Tool for PolygonTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Polygon
    }

    fn deactivate(&mut self) {
        self.reset();
    }

    fn update_style(&mut self, style: &StyleConfig) {
        self.style = style.clone();
    }

    fn pointer_down(&mut self, _ctx: &ToolContext, input: PointerInput) -> bool {
        self.vertices.push(input.geo);
        self.cursor = Some(input.geo);
        true
    }

    fn pointer_move(&mut self, _ctx: &ToolContext, input: PointerInput) -> bool {
        if self.vertices.is_empty() {
            return false;
        }
        self.cursor = Some(input.geo);
        true
    }

    fn double_click(&mut self, ctx: &ToolContext, _input: PointerInput) -> bool {
        self.complete(ctx)
    }

    fn key(&mut self, ctx: &ToolContext, key: ToolKey) -> bool {
        match key {
            ToolKey::Enter => self.complete(ctx),
            ToolKey::Escape if !self.vertices.is_empty() => {
                self.reset();
                true
            }
            ToolKey::Backspace => self.vertices.pop().is_some(),
            _ => false,
        }
    }

    fn draw_overlay(&self, painter: &mut dyn GeoPainter) {
        if self.vertices.is_empty() {
            return;
        }
        let mut preview = self.vertices.clone();
        if let Some(cursor) = self.cursor {
            preview.push(cursor);
        }
        if preview.len() >= 3 {
            let mut ring = preview.clone();
            ring.push(preview[0]);
            let area = AreaStyle::new(self.style.fill_color, self.style.hatch_pattern);
            painter.draw_polygon(&ring, self.style.line_color, self.style.line_thickness, &area);
        } else {
            painter.draw_line(&preview, self.style.line_color, self.style.line_thickness);
        }
    }

    fn is_capturing(&self) -> bool {
        !self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeType;
    use crate::tools::test_support::{Harness, at};

    #[test]
    fn test_double_click_closes_ring() {
        let mut h = Harness::new();
        let mut tool = PolygonTool::new();
        tool.pointer_down(&h.ctx(), at(0.0, 0.0));
        tool.pointer_down(&h.ctx(), at(100.0, 0.0));
        tool.pointer_down(&h.ctx(), at(100.0, 100.0));
        // the double-click's own presses land on the last vertex
        tool.pointer_down(&h.ctx(), at(100.0, 100.0));
        tool.double_click(&h.ctx(), at(100.0, 100.0));

        h.apply();
        assert_eq!(h.shapes.len(), 1);
        let poly = &h.shapes[0];
        assert_eq!(poly.shape_type(), ShapeType::Polygon);
        assert_eq!(poly.points.len(), 4);
        assert_eq!(poly.points[3], poly.points[0]);
        assert!(!tool.is_capturing());
    }

    #[test]
    fn test_enter_completes() {
        let mut h = Harness::new();
        let mut tool = PolygonTool::new();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)] {
            tool.pointer_down(&h.ctx(), at(x * 50.0, y * 50.0));
        }
        assert!(tool.key(&h.ctx(), ToolKey::Enter));
        h.apply();
        assert_eq!(h.shapes[0].points.len(), 4);
    }

    #[test]
    fn test_too_few_vertices_keeps_capturing() {
        let mut h = Harness::new();
        let mut tool = PolygonTool::new();
        tool.pointer_down(&h.ctx(), at(0.0, 0.0));
        tool.pointer_down(&h.ctx(), at(50.0, 0.0));
        assert!(!tool.double_click(&h.ctx(), at(50.0, 0.0)));
        assert!(h.apply().is_empty());
        assert!(tool.is_capturing());
        assert_eq!(tool.vertices().len(), 2);
    }

    #[test]
    fn test_escape_and_backspace() {
        let h = Harness::new();
        let mut tool = PolygonTool::new();
        tool.pointer_down(&h.ctx(), at(0.0, 0.0));
        tool.pointer_down(&h.ctx(), at(50.0, 0.0));
        assert!(tool.key(&h.ctx(), ToolKey::Backspace));
        assert_eq!(tool.vertices().len(), 1);
        assert!(tool.key(&h.ctx(), ToolKey::Escape));
        assert!(!tool.is_capturing());
        assert!(h.rx.is_empty());
    }
}
