//! Canonical shape list, selection, and draw ordering.

use crate::painter::GeoPainter;
use crate::persist::EditorState;
use crate::selection::render_selection;
use crate::shapes::{Shape, ShapeError, ShapeId, ShapeKind};

/// Holds the authoritative shapes and selected id and decides draw order.
///
/// Every mutator returns `true` when the state actually changed, which is
/// the caller's cue to schedule a redraw.
#[derive(Debug, Clone, Default)]
pub struct RenderManager {
    state: EditorState,
}

impl RenderManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.state.shapes
    }

    pub fn selected_id(&self) -> Option<ShapeId> {
        self.state.selected_shape_id
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.state.shapes.iter().find(|s| s.id() == id)
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.selected_id().and_then(|id| self.shape(id))
    }

    /// Replace the whole list and selection. A no-op when the sanitized
    /// input equals the current state.
    pub fn set_shapes(&mut self, shapes: Vec<Shape>, selected: Option<ShapeId>) -> bool {
        let next = EditorState::new(shapes, selected).sanitized();
        if next == self.state {
            return false;
        }
        self.state = next;
        true
    }

    /// Append a new shape. Rejects a duplicate id.
    pub fn add_shape(&mut self, shape: Shape) -> bool {
        if self.shape(shape.id()).is_some() {
            log::warn!("ignoring shape with duplicate id {}", shape.id());
            return false;
        }
        self.state.shapes.push(shape);
        true
    }

    /// Replace the shape with the same id. The type may not change.
    pub fn replace_shape(&mut self, shape: Shape) -> bool {
        let Some(slot) = self.state.shapes.iter_mut().find(|s| s.id() == shape.id()) else {
            log::debug!("replace for unknown shape {}", shape.id());
            return false;
        };
        if slot.shape_type() != shape.shape_type() {
            log::warn!(
                "refusing to change shape {} from {} to {}",
                shape.id(),
                slot.shape_type(),
                shape.shape_type()
            );
            return false;
        }
        if *slot == shape {
            return false;
        }
        *slot = shape;
        true
    }

    /// Remove a shape, clearing the selection if it pointed at it.
    pub fn remove_shape(&mut self, id: ShapeId) -> bool {
        let before = self.state.shapes.len();
        self.state.shapes.retain(|s| s.id() != id);
        if self.state.selected_shape_id == Some(id) {
            self.state.selected_shape_id = None;
        }
        self.state.shapes.len() != before
    }

    /// Select a shape by id, or clear with `None`. Unknown ids are ignored.
    pub fn select(&mut self, id: Option<ShapeId>) -> bool {
        if let Some(id) = id {
            if self.shape(id).is_none() {
                log::debug!("cannot select unknown shape {}", id);
                return false;
            }
        }
        if self.state.selected_shape_id == id {
            return false;
        }
        self.state.selected_shape_id = id;
        true
    }

    /// Mutate the selected shape in place.
    pub fn update_selected(&mut self, f: impl FnOnce(&mut Shape)) -> bool {
        let Some(id) = self.state.selected_shape_id else {
            return false;
        };
        let Some(shape) = self.state.shapes.iter_mut().find(|s| s.id() == id) else {
            return false;
        };
        let before = shape.clone();
        f(shape);
        *shape != before
    }

    /// Snapshot for persistence.
    pub fn get_state(&self) -> EditorState {
        self.state.clone()
    }

    pub fn set_state(&mut self, state: EditorState) -> bool {
        self.set_shapes(state.shapes, state.selected_shape_id)
    }

    /// Draw every unselected shape in list order, then the selected shape
    /// and its handles on top.
    pub fn render(&self, painter: &mut dyn GeoPainter) {
        self.render_without(painter, None);
    }

    /// Like [`render`](Self::render) but leaves out `hidden`, which a tool
    /// is drawing in its overlay instead.
    pub fn render_without(&self, painter: &mut dyn GeoPainter, hidden: Option<ShapeId>) {
        let selected = self.selected_id();
        let visible = |s: &&Shape| Some(s.id()) != selected && Some(s.id()) != hidden;
        for shape in self.state.shapes.iter().filter(visible) {
            draw_shape(shape, painter);
        }
        if let Some(shape) = self.selected_shape() {
            if Some(shape.id()) != hidden {
                draw_shape(shape, painter);
                render_selection(shape, painter);
            }
        }
    }

    /// Draw every shape in list order without any selection UI.
    pub fn render_export(&self, painter: &mut dyn GeoPainter) {
        for shape in &self.state.shapes {
            draw_shape(shape, painter);
        }
    }
}

/// Draw one shape through the painter's primitives.
///
/// Shapes missing data their type requires are skipped with a log line and
/// left untouched in the list.
pub fn draw_shape(shape: &Shape, painter: &mut dyn GeoPainter) {
    if let Err(e @ (ShapeError::MissingSignUrl | ShapeError::EmptyText)) = shape.validate() {
        log::warn!("skipping {} {}: {}", shape.shape_type(), shape.id(), e);
        return;
    }
    let (color, width) = (shape.color, shape.thickness);
    match shape.kind() {
        ShapeKind::Line | ShapeKind::Freehand => painter.draw_line(&shape.points, color, width),
        ShapeKind::Arrow => {
            if let [from, to] = shape.points[..] {
                painter.draw_arrow(from, to, color, width);
            }
        }
        ShapeKind::Rectangle(area) | ShapeKind::Polygon(area) => {
            painter.draw_polygon(&shape.points, color, width, area);
        }
        ShapeKind::Dimension { measurement } => {
            if let [from, to] = shape.points[..] {
                painter.draw_dimension_line(from, to, measurement, color, width);
            }
        }
        ShapeKind::Text(data) => {
            if let Some(anchor) = shape.anchor() {
                painter.draw_text(anchor, data);
            }
        }
        ShapeKind::Sign { sign_data } => {
            if let Some(anchor) = shape.anchor() {
                painter.draw_sign(anchor, sign_data);
            }
        }
    }
}
