//! Tool state machine.
//!
//! Exactly one tool is active at a time. Tools turn pointer and keyboard
//! input into bus events; they never own or mutate the shape list.
//! Every input method returns `true` when the tool's overlay changed and
//! the surface needs a redraw.

mod freehand;
mod pan;
mod polygon;
mod rectangle;
mod select;
mod sign;
mod text;
mod two_point;

pub use freehand::{FreehandTool, smooth_path};
pub use pan::PanTool;
pub use polygon::PolygonTool;
pub use rectangle::{RectangleTool, screen_rect_corners};
pub use select::SelectTool;
pub use sign::{IconDrop, SignTool, place_sign};
pub use text::TextTool;
pub use two_point::TwoPointTool;

use crate::config::{EngineConfig, StyleConfig};
use crate::events::EventBus;
use crate::geo::GeoPoint;
use crate::painter::GeoPainter;
use crate::projection::Projection;
use crate::shapes::{Shape, ShapeId};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Line,
    Arrow,
    Rectangle,
    Polygon,
    Freehand,
    Dimension,
    Text,
    Sign,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
            ToolKind::Line => "line",
            ToolKind::Arrow => "arrow",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Polygon => "polygon",
            ToolKind::Freehand => "freehand",
            ToolKind::Dimension => "dimension",
            ToolKind::Text => "text",
            ToolKind::Sign => "sign",
        }
    }

    /// Look a tool up by name; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == name)
    }

    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::Select,
            ToolKind::Pan,
            ToolKind::Line,
            ToolKind::Arrow,
            ToolKind::Rectangle,
            ToolKind::Polygon,
            ToolKind::Freehand,
            ToolKind::Dimension,
            ToolKind::Text,
            ToolKind::Sign,
        ]
    }
}

/// One pointer sample in both coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub screen: Point,
    pub geo: GeoPoint,
}

impl PointerInput {
    pub fn new(screen: Point, geo: GeoPoint) -> Self {
        Self { screen, geo }
    }

    /// Build from a screen point using the current projection.
    pub fn at(projection: &dyn Projection, screen: Point) -> Self {
        Self::new(screen, projection.unproject(screen))
    }
}

/// Keys tools react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKey {
    Enter,
    /// Line break inside text entry (Shift+Enter).
    NewLine,
    Escape,
    Backspace,
    Delete,
}

/// Read-only view of the editor handed to tools for one input event.
pub struct ToolContext<'a> {
    pub projection: &'a dyn Projection,
    pub shapes: &'a [Shape],
    pub selected: Option<ShapeId>,
    pub bus: &'a EventBus,
    pub config: &'a EngineConfig,
}

impl ToolContext<'_> {
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.selected.and_then(|id| self.shape(id))
    }
}

/// Common interface of every tool.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    fn activate(&mut self) {}

    /// Drop any in-progress geometry without publishing anything.
    fn deactivate(&mut self);

    fn update_style(&mut self, style: &StyleConfig);

    /// Configure the icon placed by a click (sign tool only).
    fn set_icon(&mut self, _icon: Option<IconDrop>) {}

    fn pointer_down(&mut self, _ctx: &ToolContext, _input: PointerInput) -> bool {
        false
    }

    fn pointer_move(&mut self, _ctx: &ToolContext, _input: PointerInput) -> bool {
        false
    }

    fn pointer_up(&mut self, _ctx: &ToolContext, _input: PointerInput) -> bool {
        false
    }

    fn double_click(&mut self, _ctx: &ToolContext, _input: PointerInput) -> bool {
        false
    }

    fn key(&mut self, _ctx: &ToolContext, _key: ToolKey) -> bool {
        false
    }

    fn text_input(&mut self, _ctx: &ToolContext, _text: &str) -> bool {
        false
    }

    /// Focus left the surface.
    fn blur(&mut self, _ctx: &ToolContext) -> bool {
        false
    }

    /// Draw transient feedback on top of committed shapes.
    fn draw_overlay(&self, _painter: &mut dyn GeoPainter) {}

    /// Committed shape the overlay currently stands in for.
    fn hidden_shape(&self) -> Option<ShapeId> {
        None
    }

    /// Whether an interaction is in progress.
    fn is_capturing(&self) -> bool;
}

fn create_tool(kind: ToolKind, icon: Option<IconDrop>) -> Box<dyn Tool> {
    match kind {
        ToolKind::Select => Box::new(SelectTool::new()),
        ToolKind::Pan => Box::new(PanTool::new()),
        ToolKind::Line | ToolKind::Arrow | ToolKind::Dimension => Box::new(TwoPointTool::new(kind)),
        ToolKind::Rectangle => Box::new(RectangleTool::new()),
        ToolKind::Polygon => Box::new(PolygonTool::new()),
        ToolKind::Freehand => Box::new(FreehandTool::new()),
        ToolKind::Text => Box::new(TextTool::new()),
        ToolKind::Sign => Box::new(SignTool::new(icon)),
    }
}

/// Owns the active tool.
#[derive(Default)]
pub struct ToolManager {
    active: Option<Box<dyn Tool>>,
    style: StyleConfig,
    sign_icon: Option<IconDrop>,
}

impl std::fmt::Debug for ToolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolManager")
            .field("active", &self.active_kind())
            .field("sign_icon", &self.sign_icon)
            .finish()
    }
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_kind(&self) -> Option<ToolKind> {
        self.active.as_ref().map(|t| t.kind())
    }

    pub fn is_capturing(&self) -> bool {
        self.active.as_ref().is_some_and(|t| t.is_capturing())
    }

    /// Switch tools. The previous tool is deactivated before the next one
    /// is created, so in-progress geometry is discarded silently.
    pub fn set_active_tool(&mut self, kind: Option<ToolKind>) {
        if let Some(mut previous) = self.active.take() {
            log::debug!("deactivating {} tool", previous.kind().as_str());
            previous.deactivate();
        }
        if let Some(kind) = kind {
            let mut tool = create_tool(kind, self.sign_icon.clone());
            tool.update_style(&self.style);
            tool.activate();
            log::debug!("activated {} tool", kind.as_str());
            self.active = Some(tool);
        }
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn update_style(&mut self, style: &StyleConfig) {
        self.style = style.clone();
        if let Some(tool) = self.active.as_mut() {
            tool.update_style(style);
        }
    }

    pub fn sign_icon(&self) -> Option<&IconDrop> {
        self.sign_icon.as_ref()
    }

    pub fn set_sign_icon(&mut self, icon: Option<IconDrop>) {
        self.sign_icon = icon.clone();
        if let Some(tool) = self.active.as_mut() {
            tool.set_icon(icon);
        }
    }

    pub fn pointer_down(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        self.active.as_mut().is_some_and(|t| t.pointer_down(ctx, input))
    }

    pub fn pointer_move(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        self.active.as_mut().is_some_and(|t| t.pointer_move(ctx, input))
    }

    pub fn pointer_up(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        self.active.as_mut().is_some_and(|t| t.pointer_up(ctx, input))
    }

    pub fn double_click(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        self.active.as_mut().is_some_and(|t| t.double_click(ctx, input))
    }

    pub fn key(&mut self, ctx: &ToolContext, key: ToolKey) -> bool {
        self.active.as_mut().is_some_and(|t| t.key(ctx, key))
    }

    pub fn text_input(&mut self, ctx: &ToolContext, text: &str) -> bool {
        self.active.as_mut().is_some_and(|t| t.text_input(ctx, text))
    }

    pub fn blur(&mut self, ctx: &ToolContext) -> bool {
        self.active.as_mut().is_some_and(|t| t.blur(ctx))
    }

    pub fn draw_overlay(&self, painter: &mut dyn GeoPainter) {
        if let Some(tool) = self.active.as_ref() {
            tool.draw_overlay(painter);
        }
    }

    /// Shape the scene must not draw while the active tool previews it.
    pub fn hidden_shape(&self) -> Option<ShapeId> {
        self.active.as_ref().and_then(|t| t.hidden_shape())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::events::{EditorEvent, EventFilter, EventReceiver};
    use crate::test_util::Identity;

    /// Bus, receiver and config for driving a tool in isolation.
    pub struct Harness {
        pub bus: EventBus,
        pub rx: EventReceiver,
        pub config: EngineConfig,
        pub shapes: Vec<Shape>,
        pub selected: Option<ShapeId>,
    }

    impl Harness {
        pub fn new() -> Self {
            let bus = EventBus::new();
            let rx = bus.receiver(EventFilter::All);
            Self {
                bus,
                rx,
                config: EngineConfig::default(),
                shapes: Vec::new(),
                selected: None,
            }
        }

        pub fn ctx(&self) -> ToolContext<'_> {
            ToolContext {
                projection: &Identity,
                shapes: &self.shapes,
                selected: self.selected,
                bus: &self.bus,
                config: &self.config,
            }
        }

        /// Apply drained events the way the editor does.
        pub fn apply(&mut self) -> Vec<EditorEvent> {
            let events = self.rx.drain();
            for event in &events {
                match event {
                    EditorEvent::ShapeComplete(s) => self.shapes.push(s.clone()),
                    EditorEvent::ShapeMove(s) | EditorEvent::ShapeUpdate(s) => {
                        if let Some(slot) = self.shapes.iter_mut().find(|x| x.id() == s.id()) {
                            *slot = s.clone();
                        }
                    }
                    EditorEvent::ShapeDelete(id) => self.shapes.retain(|x| x.id() != *id),
                    EditorEvent::SelectionChange(sel) => self.selected = *sel,
                    EditorEvent::ViewportChanged(_) => {}
                }
            }
            events
        }
    }

    pub fn at(x: f64, y: f64) -> PointerInput {
        PointerInput::new(Point::new(x, y), GeoPoint::new(x, y))
    }
}
