//! Text label data and block layout metrics.

use super::SerializableColor;
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Average glyph advance as a fraction of the font size.
pub const CHAR_WIDTH_FACTOR: f64 = 0.6;
/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;
/// Padding between the text block and its box, in pixels.
pub const TEXT_PADDING: f64 = 4.0;

/// Horizontal alignment of a text block relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl TextAlign {
    /// Fraction of the line width that sits left of the anchor.
    pub fn anchor_factor(self) -> f64 {
        match self {
            TextAlign::Left => 0.0,
            TextAlign::Center => 0.5,
            TextAlign::Right => 1.0,
        }
    }
}

/// Text-specific shape fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    /// Content, possibly multi-line.
    #[serde(default)]
    pub text: String,
    /// Font size in screen pixels.
    pub size: f64,
    pub font_color: SerializableColor,
    #[serde(default)]
    pub alignment: TextAlign,
    /// Rotation in degrees about the anchor.
    #[serde(default)]
    pub rotation: f64,
    /// Optional box fill behind the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<SerializableColor>,
    /// Optional box border.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<SerializableColor>,
}

impl TextData {
    pub fn new(text: impl Into<String>, size: f64, font_color: SerializableColor) -> Self {
        Self {
            text: text.into(),
            size,
            font_color,
            alignment: TextAlign::default(),
            rotation: 0.0,
            fill_color: None,
            border_color: None,
        }
    }

    pub fn with_alignment(mut self, alignment: TextAlign) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn line_height(&self) -> f64 {
        self.size * LINE_HEIGHT_FACTOR
    }

    /// Lines of the block. An empty string still occupies one line.
    pub fn lines(&self) -> Vec<&str> {
        self.text.split('\n').collect()
    }

    /// Estimated advance width of one line.
    pub fn line_width(&self, line: &str) -> f64 {
        line.chars().count() as f64 * self.size * CHAR_WIDTH_FACTOR
    }

    /// Width of the widest line.
    pub fn block_width(&self) -> f64 {
        self.lines()
            .iter()
            .map(|l| self.line_width(l))
            .fold(0.0, f64::max)
    }

    /// Total height of all lines, without padding.
    pub fn block_height(&self) -> f64 {
        self.lines().len() as f64 * self.line_height()
    }

    /// Vertical offset of each line's middle relative to the anchor.
    ///
    /// The block is vertically centered on the anchor.
    pub fn line_offsets(&self) -> Vec<f64> {
        let lh = self.line_height();
        let top = -self.block_height() / 2.0;
        (0..self.lines().len())
            .map(|i| top + (i as f64 + 0.5) * lh)
            .collect()
    }

    /// Unrotated box around the text, relative to the anchor at the origin.
    pub fn local_bounds(&self) -> Rect {
        let width = self.block_width();
        let height = self.block_height();
        let x0 = -width * self.alignment.anchor_factor();
        Rect::new(x0, -height / 2.0, x0 + width, height / 2.0).inflate(TEXT_PADDING, TEXT_PADDING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(text: &str) -> TextData {
        TextData::new(text, 10.0, SerializableColor::black())
    }

    #[test]
    fn test_single_line_is_centered_on_anchor() {
        let t = data("abcd");
        let offsets = t.line_offsets();
        assert_eq!(offsets.len(), 1);
        assert!(offsets[0].abs() < f64::EPSILON);

        let b = t.local_bounds();
        assert!((b.center().x).abs() < 1e-9);
        assert!((b.center().y).abs() < 1e-9);
        assert!((b.width() - (24.0 + 2.0 * TEXT_PADDING)).abs() < 1e-9);
    }

    #[test]
    fn test_multi_line_offsets_are_symmetric() {
        let t = data("one\ntwo\nthree");
        let offsets = t.line_offsets();
        assert_eq!(offsets.len(), 3);
        assert!((offsets[0] + offsets[2]).abs() < 1e-9);
        assert!(offsets[1].abs() < 1e-9);
        assert!((offsets[1] - offsets[0] - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_alignment_moves_box() {
        let left = data("ab").with_alignment(TextAlign::Left).local_bounds();
        let right = data("ab").with_alignment(TextAlign::Right).local_bounds();
        assert!((left.x0 + TEXT_PADDING).abs() < 1e-9);
        assert!((right.x1 - TEXT_PADDING).abs() < 1e-9);
    }
}
