//! Shape definitions for geo-referenced annotations.
//!
//! A [`Shape`] is a closed tagged union: the common fields (id, points,
//! stroke color and thickness) live on the struct and everything that only
//! makes sense for one type lives in its [`ShapeKind`] variant.

mod area;
mod sign;
mod text;

pub use area::{AreaStyle, HatchPattern};
pub use sign::{SignData, clamp_size, normalize_rotation};
pub use text::{CHAR_WIDTH_FACTOR, LINE_HEIGHT_FACTOR, TEXT_PADDING, TextAlign, TextData};

use crate::config::StyleConfig;
use crate::geo::{GeoPoint, Units, measure};
use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Structural problems with a shape's data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("{shape_type} needs {expected} points, got {actual}")]
    WrongPointCount {
        shape_type: ShapeType,
        expected: &'static str,
        actual: usize,
    },
    #[error("{0} ring is not closed")]
    OpenRing(ShapeType),
    #[error("sign has no icon url")]
    MissingSignUrl,
    #[error("text shape has no text")]
    EmptyText,
    #[error("non-finite coordinate at point {0}")]
    NonFiniteCoordinate(usize),
}

/// Discriminant of a [`Shape`], immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Line,
    Arrow,
    Rectangle,
    Polygon,
    Dimension,
    Text,
    Sign,
    Freehand,
}

impl ShapeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeType::Line => "line",
            ShapeType::Arrow => "arrow",
            ShapeType::Rectangle => "rectangle",
            ShapeType::Polygon => "polygon",
            ShapeType::Dimension => "dimension",
            ShapeType::Text => "text",
            ShapeType::Sign => "sign",
            ShapeType::Freehand => "freehand",
        }
    }
}

impl std::fmt::Display for ShapeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific shape data, serialized under the `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShapeKind {
    Line,
    Arrow,
    Rectangle(AreaStyle),
    Polygon(AreaStyle),
    Dimension {
        #[serde(default)]
        measurement: String,
    },
    Text(TextData),
    Sign {
        #[serde(rename = "signData")]
        sign_data: SignData,
    },
    Freehand,
}

impl ShapeKind {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeKind::Line => ShapeType::Line,
            ShapeKind::Arrow => ShapeType::Arrow,
            ShapeKind::Rectangle(_) => ShapeType::Rectangle,
            ShapeKind::Polygon(_) => ShapeType::Polygon,
            ShapeKind::Dimension { .. } => ShapeType::Dimension,
            ShapeKind::Text(_) => ShapeType::Text,
            ShapeKind::Sign { .. } => ShapeType::Sign,
            ShapeKind::Freehand => ShapeType::Freehand,
        }
    }
}

/// One persisted annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    id: ShapeId,
    #[serde(flatten)]
    kind: ShapeKind,
    /// Geographic vertices; meaning depends on the kind.
    pub points: Vec<GeoPoint>,
    /// Stroke color.
    pub color: SerializableColor,
    /// Stroke width in screen pixels.
    pub thickness: f64,
}

impl Shape {
    fn new(kind: ShapeKind, points: Vec<GeoPoint>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            points,
            color: SerializableColor::black(),
            thickness: 2.0,
        }
    }

    pub fn line(a: GeoPoint, b: GeoPoint) -> Self {
        Self::new(ShapeKind::Line, vec![a, b])
    }

    pub fn arrow(a: GeoPoint, b: GeoPoint) -> Self {
        Self::new(ShapeKind::Arrow, vec![a, b])
    }

    /// A dimension callout with its measurement computed from the endpoints.
    pub fn dimension(a: GeoPoint, b: GeoPoint, units: Units) -> Self {
        Self::new(
            ShapeKind::Dimension {
                measurement: measure(a, b, units),
            },
            vec![a, b],
        )
    }

    /// A rectangle from its four corners in drawing order; the ring is closed here.
    pub fn rectangle(corners: [GeoPoint; 4], area: AreaStyle) -> Self {
        let mut points = corners.to_vec();
        points.push(corners[0]);
        Self::new(ShapeKind::Rectangle(area), points)
    }

    /// A polygon from its vertices; the ring is closed if it is not already.
    pub fn polygon(mut vertices: Vec<GeoPoint>, area: AreaStyle) -> Self {
        if vertices.len() > 1 && vertices.first() != vertices.last() {
            let first = vertices[0];
            vertices.push(first);
        }
        Self::new(ShapeKind::Polygon(area), vertices)
    }

    pub fn text(anchor: GeoPoint, data: TextData) -> Self {
        Self::new(ShapeKind::Text(data), vec![anchor])
    }

    pub fn sign(anchor: GeoPoint, data: SignData) -> Self {
        Self::new(ShapeKind::Sign { sign_data: data }, vec![anchor])
    }

    pub fn freehand(points: Vec<GeoPoint>) -> Self {
        Self::new(ShapeKind::Freehand, points)
    }

    /// Set stroke color and thickness.
    pub fn with_stroke(mut self, color: SerializableColor, thickness: f64) -> Self {
        self.color = color;
        self.thickness = thickness;
        self
    }

    /// Apply the current style, builder form.
    pub fn with_style(mut self, style: &StyleConfig) -> Self {
        self.apply_style(style);
        self
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn shape_type(&self) -> ShapeType {
        self.kind.shape_type()
    }

    /// Fill styling for rectangles and polygons.
    pub fn area(&self) -> Option<&AreaStyle> {
        match &self.kind {
            ShapeKind::Rectangle(a) | ShapeKind::Polygon(a) => Some(a),
            _ => None,
        }
    }

    pub fn area_mut(&mut self) -> Option<&mut AreaStyle> {
        match &mut self.kind {
            ShapeKind::Rectangle(a) | ShapeKind::Polygon(a) => Some(a),
            _ => None,
        }
    }

    pub fn text_data(&self) -> Option<&TextData> {
        match &self.kind {
            ShapeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn text_data_mut(&mut self) -> Option<&mut TextData> {
        match &mut self.kind {
            ShapeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn sign_data(&self) -> Option<&SignData> {
        match &self.kind {
            ShapeKind::Sign { sign_data } => Some(sign_data),
            _ => None,
        }
    }

    pub fn sign_data_mut(&mut self) -> Option<&mut SignData> {
        match &mut self.kind {
            ShapeKind::Sign { sign_data } => Some(sign_data),
            _ => None,
        }
    }

    pub fn measurement(&self) -> Option<&str> {
        match &self.kind {
            ShapeKind::Dimension { measurement } => Some(measurement),
            _ => None,
        }
    }

    /// Whether the points form a closed ring.
    pub fn is_ring(&self) -> bool {
        matches!(self.kind, ShapeKind::Rectangle(_) | ShapeKind::Polygon(_))
    }

    /// Distinct ring vertices, without the closing duplicate.
    pub fn ring_vertices(&self) -> &[GeoPoint] {
        if self.is_ring() && self.points.len() > 1 && self.points.first() == self.points.last() {
            &self.points[..self.points.len() - 1]
        } else {
            &self.points
        }
    }

    /// Anchor point of a text label or sign.
    pub fn anchor(&self) -> Option<GeoPoint> {
        match self.kind {
            ShapeKind::Text(_) | ShapeKind::Sign { .. } => self.points.first().copied(),
            _ => None,
        }
    }

    /// Rotation in degrees for shapes that carry one.
    pub fn rotation(&self) -> Option<f64> {
        match &self.kind {
            ShapeKind::Text(t) => Some(t.rotation),
            ShapeKind::Sign { sign_data } => Some(sign_data.rotation),
            _ => None,
        }
    }

    /// Set the rotation of a text label or sign, normalized to `[0, 360)`.
    pub fn set_rotation(&mut self, degrees: f64) {
        match &mut self.kind {
            ShapeKind::Text(t) => t.rotation = normalize_rotation(degrees),
            ShapeKind::Sign { sign_data } => sign_data.set_rotation(degrees),
            _ => {}
        }
    }

    /// Translate every point by a geographic delta.
    pub fn translate(&mut self, d_lng: f64, d_lat: f64) {
        for p in &mut self.points {
            *p = p.offset(d_lng, d_lat);
        }
    }

    /// Recompute a dimension's measurement from its stored endpoints.
    pub fn refresh_measurement(&mut self, units: Units) {
        if let (ShapeKind::Dimension { measurement }, [a, b]) = (&mut self.kind, &self.points[..]) {
            *measurement = measure(*a, *b, units);
        }
    }

    /// Write the style collaborator's values into this shape.
    pub fn apply_style(&mut self, style: &StyleConfig) {
        self.color = style.line_color;
        self.thickness = style.line_thickness;
        match &mut self.kind {
            ShapeKind::Rectangle(a) | ShapeKind::Polygon(a) => a.fill_color = style.fill_color,
            ShapeKind::Text(t) => t.font_color = style.font_color,
            _ => {}
        }
    }

    /// Check the structural invariants for this shape's type.
    pub fn validate(&self) -> Result<(), ShapeError> {
        if let Some(i) = self
            .points
            .iter()
            .position(|p| !p.lng.is_finite() || !p.lat.is_finite())
        {
            return Err(ShapeError::NonFiniteCoordinate(i));
        }

        let shape_type = self.shape_type();
        let n = self.points.len();
        let wrong = |expected| ShapeError::WrongPointCount {
            shape_type,
            expected,
            actual: n,
        };
        match &self.kind {
            ShapeKind::Line | ShapeKind::Arrow | ShapeKind::Dimension { .. } => {
                if n != 2 {
                    return Err(wrong("exactly 2"));
                }
            }
            ShapeKind::Rectangle(_) | ShapeKind::Polygon(_) => {
                if n < 4 {
                    return Err(wrong("at least 4"));
                }
                if self.points.first() != self.points.last() {
                    return Err(ShapeError::OpenRing(shape_type));
                }
            }
            ShapeKind::Text(t) => {
                if n != 1 {
                    return Err(wrong("exactly 1"));
                }
                if t.text.trim().is_empty() {
                    return Err(ShapeError::EmptyText);
                }
            }
            ShapeKind::Sign { sign_data } => {
                if n != 1 {
                    return Err(wrong("exactly 1"));
                }
                if sign_data.url.trim().is_empty() {
                    return Err(ShapeError::MissingSignUrl);
                }
            }
            ShapeKind::Freehand => {
                if n < 2 {
                    return Err(wrong("at least 2"));
                }
            }
        }
        Ok(())
    }
}
