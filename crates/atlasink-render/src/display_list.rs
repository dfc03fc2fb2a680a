//! Recording backend: every draw call becomes a serializable command.
//!
//! This is the flat export surface handed to external rasterizers, and the
//! backend the tests inspect.

use atlasink_core::DrawBackend;
use atlasink_core::shapes::{SerializableColor, TextAlign};
use atlasink_core::surface::IconImage;
use kurbo::{Affine, BezPath, Size, Stroke};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// One recorded draw call. Paths are SVG path data in logical pixels and
/// transforms are affine coefficients `[a, b, c, d, e, f]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    Stroke {
        path: String,
        transform: [f64; 6],
        width: f64,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        dashes: Vec<f64>,
        color: SerializableColor,
    },
    Fill {
        path: String,
        transform: [f64; 6],
        color: SerializableColor,
    },
    PushClip {
        path: String,
        transform: [f64; 6],
    },
    PopClip,
    Text {
        text: String,
        transform: [f64; 6],
        size: f64,
        color: SerializableColor,
        align: TextAlign,
    },
    Image {
        pixel_width: u32,
        pixel_height: u32,
        transform: [f64; 6],
        width: f64,
        height: f64,
    },
}

/// Ordered draw commands for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayList {
    /// Backing store size in device pixels.
    pub width: u32,
    pub height: u32,
    /// Device pixel ratio.
    pub scale: f64,
    pub commands: Vec<DrawCommand>,
    #[serde(skip)]
    clip_depth: usize,
    #[serde(skip)]
    frames: u64,
}

impl DisplayList {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of clears seen, one per frame.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn strokes(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { .. }))
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl DrawBackend for DisplayList {
    fn resize(&mut self, width: u32, height: u32, scale: f64) {
        self.width = width;
        self.height = height;
        self.scale = scale;
    }

    fn clear(&mut self) {
        if self.clip_depth != 0 {
            log::warn!("frame ended with {} unbalanced clips", self.clip_depth);
        }
        self.commands.clear();
        self.clip_depth = 0;
        self.frames += 1;
    }

    fn stroke_path(&mut self, path: &BezPath, transform: Affine, stroke: &Stroke, color: Color) {
        self.commands.push(DrawCommand::Stroke {
            path: path.to_svg(),
            transform: transform.as_coeffs(),
            width: stroke.width,
            dashes: stroke.dash_pattern.to_vec(),
            color: color.into(),
        });
    }

    fn fill_path(&mut self, path: &BezPath, transform: Affine, color: Color) {
        self.commands.push(DrawCommand::Fill {
            path: path.to_svg(),
            transform: transform.as_coeffs(),
            color: color.into(),
        });
    }

    fn push_clip(&mut self, path: &BezPath, transform: Affine) {
        self.clip_depth += 1;
        self.commands.push(DrawCommand::PushClip {
            path: path.to_svg(),
            transform: transform.as_coeffs(),
        });
    }

    fn pop_clip(&mut self) {
        if self.clip_depth == 0 {
            log::warn!("pop_clip without matching push_clip");
            return;
        }
        self.clip_depth -= 1;
        self.commands.push(DrawCommand::PopClip);
    }

    fn draw_text(&mut self, text: &str, transform: Affine, size: f64, color: Color, align: TextAlign) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            transform: transform.as_coeffs(),
            size,
            color: color.into(),
            align,
        });
    }

    fn draw_image(&mut self, image: &IconImage, transform: Affine, size: Size) {
        self.commands.push(DrawCommand::Image {
            pixel_width: image.width,
            pixel_height: image.height,
            transform: transform.as_coeffs(),
            width: size.width,
            height: size.height,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Rect, Shape as _};

    #[test]
    fn test_records_in_order() {
        let mut list = DisplayList::new();
        list.resize(200, 100, 2.0);
        list.clear();
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1);
        list.fill_path(&rect, Affine::scale(2.0), Color::from_rgba8(255, 0, 0, 255));
        list.push_clip(&rect, Affine::IDENTITY);
        let mut line = BezPath::new();
        line.move_to(Point::new(0.0, 0.0));
        line.line_to(Point::new(10.0, 10.0));
        list.stroke_path(&line, Affine::IDENTITY, &Stroke::new(3.0), Color::from_rgba8(0, 0, 0, 255));
        list.pop_clip();

        assert_eq!(list.len(), 4);
        assert!(matches!(list.commands[0], DrawCommand::Fill { transform, .. } if transform[0] == 2.0));
        match &list.commands[2] {
            DrawCommand::Stroke { path, width, .. } => {
                assert!(path.starts_with('M') && path.contains('L'));
                assert!((width - 3.0).abs() < f64::EPSILON);
            }
            other => panic!("expected stroke, got {other:?}"),
        }
        assert_eq!(list.commands[3], DrawCommand::PopClip);
    }

    #[test]
    fn test_clear_starts_new_frame() {
        let mut list = DisplayList::new();
        list.clear();
        list.draw_text("a", Affine::IDENTITY, 12.0, Color::from_rgba8(0, 0, 0, 255), TextAlign::Left);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.frames(), 2);
    }

    #[test]
    fn test_unbalanced_pop_ignored() {
        let mut list = DisplayList::new();
        list.pop_clip();
        assert!(list.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let mut list = DisplayList::new();
        list.resize(10, 10, 1.0);
        list.draw_text("Gate", Affine::IDENTITY, 16.0, Color::from_rgba8(0, 0, 0, 255), TextAlign::Right);
        let value: serde_json::Value = serde_json::from_str(&list.to_json().unwrap()).unwrap();
        assert_eq!(value["width"], 10);
        assert_eq!(value["commands"][0]["op"], "text");
        assert_eq!(value["commands"][0]["align"], "right");
    }
}
