//! Select tool: pick, drag, resize, rotate, delete and edit text in place.

use super::text::{caret_path, push_text};
use super::{PointerInput, Tool, ToolContext, ToolKey, ToolKind};
use crate::config::StyleConfig;
use crate::events::EditorEvent;
use crate::geo::GeoPoint;
use crate::geometry::{nearest_shape, shape_distance};
use crate::painter::GeoPainter;
use crate::render_manager::draw_shape;
use crate::selection::{HandleKind, apply_drag, apply_handle, hit_test_handles, render_selection};
use crate::shapes::{Shape, ShapeId, ShapeKind};
use kurbo::{Point, Stroke};

/// An active drag of a whole shape or one of its handles.
#[derive(Debug)]
struct Manipulation {
    /// Shape as it was when grabbed; every frame is computed from it.
    original: Shape,
    handle: Option<HandleKind>,
    grab_screen: Point,
    grab_geo: GeoPoint,
    moved: bool,
}

/// In-place editing of a text shape. Keystrokes only touch `current`; the
/// shape list sees the result once, on commit.
#[derive(Debug)]
struct TextEdit {
    original: Shape,
    current: Shape,
}

impl TextEdit {
    fn text_mut(&mut self) -> Option<&mut String> {
        self.current.text_data_mut().map(|t| &mut t.text)
    }
}

#[derive(Debug, Default)]
pub struct SelectTool {
    manipulation: Option<Manipulation>,
    editing: Option<TextEdit>,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the text shape being edited in place.
    pub fn editing_id(&self) -> Option<ShapeId> {
        self.editing.as_ref().map(|e| e.current.id())
    }

    fn select(&self, ctx: &ToolContext, id: Option<ShapeId>) {
        if ctx.selected != id {
            ctx.bus.publish(EditorEvent::SelectionChange(id));
        }
    }

    fn commit_edit(&mut self, ctx: &ToolContext) -> bool {
        let Some(edit) = self.editing.take() else {
            return false;
        };
        let id = edit.current.id();
        let empty = edit
            .current
            .text_data()
            .is_none_or(|t| t.text.trim().is_empty());
        if empty {
            log::debug!("text {} emptied, deleting", id);
            ctx.bus.publish(EditorEvent::ShapeDelete(id));
            if ctx.selected == Some(id) {
                ctx.bus.publish(EditorEvent::SelectionChange(None));
            }
        } else if edit.current != edit.original {
            ctx.bus.publish(EditorEvent::ShapeUpdate(edit.current));
        }
        true
    }

    fn cancel_edit(&mut self) -> bool {
        let Some(edit) = self.editing.take() else {
            return false;
        };
        log::debug!("discarded edit of text {}", edit.original.id());
        true
    }

    fn edit_text(&mut self, f: impl FnOnce(&mut String) -> bool) -> bool {
        self.editing
            .as_mut()
            .and_then(TextEdit::text_mut)
            .is_some_and(f)
    }

    fn delete_selected(&mut self, ctx: &ToolContext) -> bool {
        let Some(id) = ctx.selected else {
            return false;
        };
        self.manipulation = None;
        ctx.bus.publish(EditorEvent::ShapeDelete(id));
        ctx.bus.publish(EditorEvent::SelectionChange(None));
        true
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn deactivate(&mut self) {
        self.manipulation = None;
        self.editing = None;
    }

    fn update_style(&mut self, _style: &StyleConfig) {}

    fn pointer_down(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        if let Some(edit) = self.editing.as_ref() {
            let inside = shape_distance(&edit.current, ctx.projection, input.screen)
                .is_some_and(|d| d <= 0.0);
            if inside {
                return false;
            }
            self.commit_edit(ctx);
        }

        // handles of the current selection take priority
        if let Some(selected) = ctx.selected_shape() {
            if let Some(handle) = hit_test_handles(selected, ctx.projection, ctx.config, input.screen) {
                log::debug!("grabbed {:?} handle of {}", handle, selected.id());
                self.manipulation = Some(Manipulation {
                    original: selected.clone(),
                    handle: Some(handle),
                    grab_screen: input.screen,
                    grab_geo: input.geo,
                    moved: false,
                });
                return true;
            }
        }

        let hit = nearest_shape(ctx.shapes, ctx.projection, input.screen, ctx.config.selection_threshold);
        self.select(ctx, hit);
        self.manipulation = hit.and_then(|id| ctx.shape(id)).map(|shape| Manipulation {
            original: shape.clone(),
            handle: None,
            grab_screen: input.screen,
            grab_geo: input.geo,
            moved: false,
        });
        true
    }

    fn pointer_move(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        let Some(m) = self.manipulation.as_mut() else {
            return false;
        };
        if !m.moved && (input.screen - m.grab_screen).hypot() < ctx.config.drag_threshold {
            return false;
        }
        m.moved = true;
        match m.handle {
            None => {
                let shape = apply_drag(&m.original, m.grab_geo, input.geo, ctx.config);
                ctx.bus.publish(EditorEvent::ShapeMove(shape));
                true
            }
            Some(handle) => {
                let Some(shape) = apply_handle(
                    &m.original,
                    handle,
                    m.grab_screen,
                    input.screen,
                    ctx.projection,
                    ctx.config,
                ) else {
                    return false;
                };
                ctx.bus.publish(EditorEvent::ShapeUpdate(shape));
                true
            }
        }
    }

    fn pointer_up(&mut self, _ctx: &ToolContext, _input: PointerInput) -> bool {
        self.manipulation
            .take()
            .is_some_and(|m| m.moved)
    }

    /// Double-click inside a text label starts in-place editing.
    fn double_click(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        self.manipulation = None;
        let target = ctx.shapes.iter().rev().find(|s| {
            matches!(s.kind(), ShapeKind::Text(_))
                && shape_distance(s, ctx.projection, input.screen).is_some_and(|d| d <= 0.0)
        });
        let Some(shape) = target else {
            return false;
        };
        if self.editing_id() == Some(shape.id()) {
            return false;
        }
        self.commit_edit(ctx);
        self.select(ctx, Some(shape.id()));
        log::debug!("editing text {}", shape.id());
        self.editing = Some(TextEdit {
            original: shape.clone(),
            current: shape.clone(),
        });
        true
    }

    fn key(&mut self, ctx: &ToolContext, key: ToolKey) -> bool {
        if self.editing.is_some() {
            return match key {
                ToolKey::Enter => self.commit_edit(ctx),
                ToolKey::Escape => self.cancel_edit(),
                ToolKey::NewLine => self.edit_text(|t| {
                    t.push('\n');
                    true
                }),
                ToolKey::Backspace => self.edit_text(|t| t.pop().is_some()),
                ToolKey::Delete => false,
            };
        }
        match key {
            ToolKey::Delete | ToolKey::Backspace => self.delete_selected(ctx),
            ToolKey::Escape if ctx.selected.is_some() => {
                self.manipulation = None;
                ctx.bus.publish(EditorEvent::SelectionChange(None));
                true
            }
            _ => false,
        }
    }

    fn text_input(&mut self, _ctx: &ToolContext, text: &str) -> bool {
        self.edit_text(|t| push_text(t, text))
    }

    fn blur(&mut self, ctx: &ToolContext) -> bool {
        self.manipulation = None;
        self.commit_edit(ctx)
    }

    fn draw_overlay(&self, painter: &mut dyn GeoPainter) {
        let Some(edit) = self.editing.as_ref() else {
            return;
        };
        let (Some(anchor), Some(data)) = (edit.current.anchor(), edit.current.text_data()) else {
            return;
        };
        if !data.text.trim().is_empty() {
            draw_shape(&edit.current, painter);
        }
        render_selection(&edit.current, painter);
        let anchor = painter.projection().project(anchor);
        painter.stroke_screen(&caret_path(anchor, data), data.font_color, &Stroke::new(1.0));
    }

    fn hidden_shape(&self) -> Option<ShapeId> {
        self.editing_id()
    }

    fn is_capturing(&self) -> bool {
        self.manipulation.is_some() || self.editing.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{SerializableColor, SignData, TextData};
    use crate::test_util::g;
    use crate::tools::test_support::{Harness, at};

    fn harness_with(shapes: Vec<Shape>) -> Harness {
        let mut h = Harness::new();
        h.shapes = shapes;
        h
    }

    #[test]
    fn test_click_selects_nearest() {
        let a = Shape::line(g(0.0, 0.0), g(100.0, 0.0));
        let b = Shape::line(g(0.0, 50.0), g(100.0, 50.0));
        let mut h = harness_with(vec![a.clone(), b.clone()]);
        let mut tool = SelectTool::new();

        tool.pointer_down(&h.ctx(), at(50.0, 48.0));
        tool.pointer_up(&h.ctx(), at(50.0, 48.0));
        h.apply();
        assert_eq!(h.selected, Some(b.id()));

        // selecting A while B is selected leaves only A
        tool.pointer_down(&h.ctx(), at(50.0, 3.0));
        tool.pointer_up(&h.ctx(), at(50.0, 3.0));
        h.apply();
        assert_eq!(h.selected, Some(a.id()));
    }

    #[test]
    fn test_click_empty_space_deselects() {
        let a = Shape::line(g(0.0, 0.0), g(100.0, 0.0));
        let mut h = harness_with(vec![a.clone()]);
        h.selected = Some(a.id());
        let mut tool = SelectTool::new();
        tool.pointer_down(&h.ctx(), at(50.0, 300.0));
        let events = h.apply();
        assert_eq!(events, vec![EditorEvent::SelectionChange(None)]);
        assert_eq!(h.selected, None);
    }

    #[test]
    fn test_drag_moves_all_points() {
        let line = Shape::line(g(0.0, 0.0), g(100.0, 0.0));
        let mut h = harness_with(vec![line.clone()]);
        let mut tool = SelectTool::new();

        tool.pointer_down(&h.ctx(), at(50.0, 0.0));
        h.apply();
        tool.pointer_move(&h.ctx(), at(60.0, 5.0));
        h.apply();
        tool.pointer_move(&h.ctx(), at(70.0, 10.0));
        tool.pointer_up(&h.ctx(), at(70.0, 10.0));
        h.apply();

        let moved = &h.shapes[0];
        assert_eq!(moved.id(), line.id());
        assert_eq!(moved.points, vec![g(20.0, 10.0), g(120.0, 10.0)]);
    }

    #[test]
    fn test_tiny_jitter_is_not_a_move() {
        let line = Shape::line(g(0.0, 0.0), g(100.0, 0.0));
        let mut h = harness_with(vec![line]);
        let mut tool = SelectTool::new();
        tool.pointer_down(&h.ctx(), at(50.0, 0.0));
        h.apply();
        assert!(!tool.pointer_move(&h.ctx(), at(50.5, 0.0)));
        assert!(!tool.pointer_up(&h.ctx(), at(50.5, 0.0)));
        assert!(h.apply().is_empty());
    }

    #[test]
    fn test_handle_drag_publishes_update() {
        let line = Shape::line(g(0.0, 0.0), g(100.0, 0.0));
        let mut h = harness_with(vec![line.clone()]);
        h.selected = Some(line.id());
        let mut tool = SelectTool::new();

        tool.pointer_down(&h.ctx(), at(100.0, 0.0));
        tool.pointer_move(&h.ctx(), at(100.0, 40.0));
        let events = h.apply();
        assert!(matches!(events.as_slice(), [EditorEvent::ShapeUpdate(_)]));
        assert_eq!(h.shapes[0].points[1], g(100.0, 40.0));
        assert_eq!(h.shapes[0].points[0], g(0.0, 0.0));
    }

    #[test]
    fn test_sign_rotate_handle() {
        let sign = Shape::sign(g(200.0, 200.0), SignData::new("stop.png", "Stop", 64.0));
        let mut h = harness_with(vec![sign.clone()]);
        h.selected = Some(sign.id());
        let mut tool = SelectTool::new();

        // rotate handle sits 30 px above the top edge
        tool.pointer_down(&h.ctx(), at(200.0, 138.0));
        tool.pointer_move(&h.ctx(), at(262.0, 200.0));
        h.apply();
        assert!((h.shapes[0].rotation().unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_delete_key() {
        let line = Shape::line(g(0.0, 0.0), g(100.0, 0.0));
        let mut h = harness_with(vec![line.clone()]);
        h.selected = Some(line.id());
        let mut tool = SelectTool::new();
        assert!(tool.key(&h.ctx(), ToolKey::Delete));
        h.apply();
        assert!(h.shapes.is_empty());
        assert_eq!(h.selected, None);
    }

    #[test]
    fn test_double_click_edits_text() {
        let text = Shape::text(g(100.0, 100.0), TextData::new("Old", 16.0, SerializableColor::black()));
        let mut h = harness_with(vec![text.clone()]);
        let mut tool = SelectTool::new();

        assert!(tool.double_click(&h.ctx(), at(100.0, 100.0)));
        h.apply();
        assert_eq!(h.selected, Some(text.id()));
        assert_eq!(tool.editing_id(), Some(text.id()));

        tool.key(&h.ctx(), ToolKey::Backspace);
        tool.key(&h.ctx(), ToolKey::Backspace);
        tool.text_input(&h.ctx(), "k");
        tool.key(&h.ctx(), ToolKey::Enter);
        h.apply();
        assert_eq!(h.shapes[0].text_data().unwrap().text, "Ok");
        assert_eq!(tool.editing_id(), None);
    }

    #[test]
    fn test_emptied_text_is_deleted() {
        let text = Shape::text(g(100.0, 100.0), TextData::new("A", 16.0, SerializableColor::black()));
        let mut h = harness_with(vec![text]);
        let mut tool = SelectTool::new();
        tool.double_click(&h.ctx(), at(100.0, 100.0));
        h.apply();
        tool.key(&h.ctx(), ToolKey::Backspace);
        h.apply();
        tool.blur(&h.ctx());
        h.apply();
        assert!(h.shapes.is_empty());
        assert_eq!(h.selected, None);
    }

    #[test]
    fn test_escape_restores_text() {
        let text = Shape::text(g(100.0, 100.0), TextData::new("Keep", 16.0, SerializableColor::black()));
        let mut h = harness_with(vec![text.clone()]);
        let mut tool = SelectTool::new();
        tool.double_click(&h.ctx(), at(100.0, 100.0));
        tool.text_input(&h.ctx(), "!!!");
        h.apply();
        tool.key(&h.ctx(), ToolKey::Escape);
        h.apply();
        assert_eq!(h.shapes[0], text);
    }

    #[test]
    fn test_typing_stays_in_tool_until_commit() {
        let text = Shape::text(g(100.0, 100.0), TextData::new("Ab", 16.0, SerializableColor::black()));
        let mut h = harness_with(vec![text.clone()]);
        let mut tool = SelectTool::new();
        tool.double_click(&h.ctx(), at(100.0, 100.0));
        h.apply();
        assert_eq!(tool.hidden_shape(), Some(text.id()));

        assert!(tool.key(&h.ctx(), ToolKey::Backspace));
        assert!(tool.text_input(&h.ctx(), "c"));
        assert!(h.apply().is_empty());
        assert_eq!(h.shapes[0], text);

        tool.key(&h.ctx(), ToolKey::Enter);
        let events = h.apply();
        assert!(matches!(events.as_slice(), [EditorEvent::ShapeUpdate(_)]));
        assert_eq!(h.shapes[0].text_data().unwrap().text, "Ac");
        assert_eq!(tool.hidden_shape(), None);
    }

    #[test]
    fn test_deactivate_mid_edit_discards_buffer() {
        let text = Shape::text(g(100.0, 100.0), TextData::new("A", 16.0, SerializableColor::black()));
        let mut h = harness_with(vec![text.clone()]);
        let mut tool = SelectTool::new();
        tool.double_click(&h.ctx(), at(100.0, 100.0));
        h.apply();
        tool.key(&h.ctx(), ToolKey::Backspace);
        tool.deactivate();
        assert!(h.apply().is_empty());
        assert_eq!(h.shapes, vec![text]);
        assert_eq!(tool.editing_id(), None);
    }
}
