//! Text tool: click to open an entry box, confirm or blur to commit.

use super::{PointerInput, Tool, ToolContext, ToolKey, ToolKind};
use crate::config::StyleConfig;
use crate::events::EditorEvent;
use crate::geo::GeoPoint;
use crate::painter::{GeoPainter, polyline_path, rect_path};
use crate::shapes::{Shape, TextData};
use kurbo::{Affine, BezPath, Point, Stroke};

/// Caret after the last character of `data` anchored at `anchor`.
pub(crate) fn caret_path(anchor: Point, data: &TextData) -> BezPath {
    let lines = data.lines();
    let offsets = data.line_offsets();
    let (Some(last), Some(&y)) = (lines.last(), offsets.last()) else {
        return BezPath::new();
    };
    let width = data.line_width(last);
    let x = width * (1.0 - data.alignment.anchor_factor());
    let half = data.line_height() / 2.0;
    let xf = Affine::translate(anchor.to_vec2()) * Affine::rotate(data.rotation.to_radians());
    polyline_path(&[xf * Point::new(x, y - half), xf * Point::new(x, y + half)], false)
}

/// Append typed characters, dropping control characters other than newlines.
pub(crate) fn push_text(buffer: &mut String, text: &str) -> bool {
    let before = buffer.len();
    buffer.extend(text.chars().filter(|c| *c == '\n' || !c.is_control()));
    buffer.len() != before
}

#[derive(Debug)]
struct Draft {
    anchor: GeoPoint,
    text: String,
}

#[derive(Debug, Default)]
pub struct TextTool {
    style: StyleConfig,
    draft: Option<Draft>,
}

impl TextTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text typed so far, if an entry box is open.
    pub fn draft_text(&self) -> Option<&str> {
        self.draft.as_ref().map(|d| d.text.as_str())
    }

    fn draft_data(&self, text: &str) -> TextData {
        TextData::new(text, self.style.font_size, self.style.font_color)
            .with_alignment(self.style.text_alignment)
    }

    fn commit(&mut self, ctx: &ToolContext) -> bool {
        let Some(draft) = self.draft.take() else {
            return false;
        };
        if draft.text.trim().is_empty() {
            log::debug!("text entry closed empty");
            return true;
        }
        let shape = Shape::text(draft.anchor, self.draft_data(&draft.text)).with_style(&self.style);
        log::debug!("text complete: {}", shape.id());
        ctx.bus.publish(EditorEvent::ShapeComplete(shape));
        true
    }
}

impl Tool for TextTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Text
    }

    fn deactivate(&mut self) {
        self.draft = None;
    }

    fn update_style(&mut self, style: &StyleConfig) {
        self.style = style.clone();
    }

    /// Opens an entry box, or commits the open one when clicking elsewhere.
    fn pointer_down(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        if self.draft.is_some() {
            return self.commit(ctx);
        }
        self.draft = Some(Draft {
            anchor: input.geo,
            text: String::new(),
        });
        true
    }

    fn key(&mut self, ctx: &ToolContext, key: ToolKey) -> bool {
        let Some(draft) = self.draft.as_mut() else {
            return false;
        };
        match key {
            ToolKey::Enter => self.commit(ctx),
            ToolKey::NewLine => {
                draft.text.push('\n');
                true
            }
            ToolKey::Escape => {
                self.draft = None;
                true
            }
            ToolKey::Backspace => draft.text.pop().is_some(),
            ToolKey::Delete => false,
        }
    }

    fn text_input(&mut self, _ctx: &ToolContext, text: &str) -> bool {
        match self.draft.as_mut() {
            Some(draft) => push_text(&mut draft.text, text),
            None => false,
        }
    }

    fn blur(&mut self, ctx: &ToolContext) -> bool {
        self.commit(ctx)
    }

    fn draw_overlay(&self, painter: &mut dyn GeoPainter) {
        let Some(draft) = self.draft.as_ref() else {
            return;
        };
        let data = self.draft_data(&draft.text);
        let anchor = painter.projection().project(draft.anchor);
        if !draft.text.is_empty() {
            painter.draw_text(draft.anchor, &data);
        }
        let frame = data.local_bounds() + anchor.to_vec2();
        let color = painter.config().selection_color;
        painter.stroke_screen(&rect_path(frame), color, &Stroke::new(1.0).with_dashes(0.0, [3.0, 3.0]));
        painter.stroke_screen(&caret_path(anchor, &data), self.style.font_color, &Stroke::new(1.0));
    }

    fn is_capturing(&self) -> bool {
        self.draft.is_some()
    }
}
