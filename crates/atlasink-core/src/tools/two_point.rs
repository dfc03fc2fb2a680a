//! Line, arrow and dimension tools: capture exactly two points.

use super::{PointerInput, Tool, ToolContext, ToolKey, ToolKind};
use crate::config::StyleConfig;
use crate::events::EditorEvent;
use crate::geo::measure;
use crate::painter::GeoPainter;
use crate::shapes::Shape;

/// Second points closer than this to the first are ignored.
const MIN_SEGMENT_PX: f64 = 1.0;

/// Shared two-click capture for [`ToolKind::Line`], [`ToolKind::Arrow`]
/// and [`ToolKind::Dimension`].
///
/// The first press anchors the segment. It completes on the next press,
/// or on release if the pointer was dragged.
#[derive(Debug)]
pub struct TwoPointTool {
    kind: ToolKind,
    style: StyleConfig,
    start: Option<PointerInput>,
    current: Option<PointerInput>,
    pressed: bool,
    dragged: bool,
}

impl TwoPointTool {
    pub fn new(kind: ToolKind) -> Self {
        debug_assert!(matches!(kind, ToolKind::Line | ToolKind::Arrow | ToolKind::Dimension));
        Self {
            kind,
            style: StyleConfig::default(),
            start: None,
            current: None,
            pressed: false,
            dragged: false,
        }
    }

    fn reset(&mut self) {
        self.start = None;
        self.current = None;
        self.pressed = false;
        self.dragged = false;
    }

    /// Publish the shape if the segment is long enough. Returns false when
    /// the end point was ignored.
    fn complete(&mut self, ctx: &ToolContext, end: PointerInput) -> bool {
        let Some(start) = self.start else {
            return false;
        };
        if (end.screen - start.screen).hypot() < MIN_SEGMENT_PX {
            return false;
        }
        let shape = match self.kind {
            ToolKind::Arrow => Shape::arrow(start.geo, end.geo),
            ToolKind::Dimension => Shape::dimension(start.geo, end.geo, ctx.config.units),
            _ => Shape::line(start.geo, end.geo),
        }
        .with_style(&self.style);
        log::debug!("{} complete: {}", self.kind.as_str(), shape.id());
        ctx.bus.publish(EditorEvent::ShapeComplete(shape));
        self.reset();
        true
    }
}

impl Tool for TwoPointTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn deactivate(&mut self) {
        self.reset();
    }

    fn update_style(&mut self, style: &StyleConfig) {
        self.style = style.clone();
    }

    fn pointer_down(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        if self.start.is_some() {
            return self.complete(ctx, input);
        }
        self.start = Some(input);
        self.current = Some(input);
        self.pressed = true;
        self.dragged = false;
        true
    }

    fn pointer_move(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        let Some(start) = self.start else {
            return false;
        };
        if self.pressed && (input.screen - start.screen).hypot() >= ctx.config.drag_threshold {
            self.dragged = true;
        }
        self.current = Some(input);
        true
    }

    fn pointer_up(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        let was_pressed = std::mem::replace(&mut self.pressed, false);
        if was_pressed && self.dragged {
            return self.complete(ctx, input);
        }
        false
    }

    fn key(&mut self, _ctx: &ToolContext, key: ToolKey) -> bool {
        if key == ToolKey::Escape && self.start.is_some() {
            self.reset();
            return true;
        }
        false
    }

    fn draw_overlay(&self, painter: &mut dyn GeoPainter) {
        let (Some(start), Some(current)) = (self.start, self.current) else {
            return;
        };
        let (color, width) = (self.style.line_color, self.style.line_thickness);
        match self.kind {
            ToolKind::Arrow => painter.draw_arrow(start.geo, current.geo, color, width),
            ToolKind::Dimension => {
                let units = painter.config().units;
                let label = measure(start.geo, current.geo, units);
                painter.draw_dimension_line(start.geo, current.geo, &label, color, width);
            }
            _ => painter.draw_line(&[start.geo, current.geo], color, width),
        }
    }

    fn is_capturing(&self) -> bool {
        self.start.is_some()
    }
}
