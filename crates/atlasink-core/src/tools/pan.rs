//! Pan tool: drags the map, never touches shapes.

use super::{PointerInput, Tool, ToolContext, ToolKind};
use crate::config::StyleConfig;
use crate::events::{EditorEvent, ViewportChange};
use crate::geo::GeoPoint;

#[derive(Debug, Default)]
pub struct PanTool {
    anchor: Option<GeoPoint>,
}

impl PanTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for PanTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pan
    }

    fn deactivate(&mut self) {
        self.anchor = None;
    }

    fn update_style(&mut self, _style: &StyleConfig) {}

    fn pointer_down(&mut self, _ctx: &ToolContext, input: PointerInput) -> bool {
        self.anchor = Some(input.geo);
        false
    }

    /// Moves the center by the inverse of the pointer's geographic delta,
    /// which keeps the grabbed point under the pointer.
    fn pointer_move(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        let Some(anchor) = self.anchor else {
            return false;
        };
        let (d_lng, d_lat) = input.geo.delta_from(anchor);
        if d_lng == 0.0 && d_lat == 0.0 {
            return false;
        }
        let center = ctx.projection.center().offset(-d_lng, -d_lat);
        ctx.bus
            .publish(EditorEvent::ViewportChanged(ViewportChange::Recenter(center)));
        false
    }

    fn pointer_up(&mut self, _ctx: &ToolContext, _input: PointerInput) -> bool {
        self.anchor = None;
        false
    }

    fn is_capturing(&self) -> bool {
        self.anchor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{Harness, at};

    #[test]
    fn test_drag_requests_inverse_recenter() {
        let mut h = Harness::new();
        let mut tool = PanTool::new();
        tool.pointer_down(&h.ctx(), at(10.0, 10.0));
        tool.pointer_move(&h.ctx(), at(15.0, 13.0));
        tool.pointer_up(&h.ctx(), at(15.0, 13.0));

        let events = h.apply();
        assert_eq!(
            events,
            vec![EditorEvent::ViewportChanged(ViewportChange::Recenter(GeoPoint::new(-5.0, -3.0)))]
        );
        assert!(h.shapes.is_empty());
        assert!(!tool.is_capturing());
    }

    #[test]
    fn test_move_without_press_does_nothing() {
        let mut h = Harness::new();
        let mut tool = PanTool::new();
        tool.pointer_move(&h.ctx(), at(15.0, 13.0));
        assert!(h.apply().is_empty());
    }
}
