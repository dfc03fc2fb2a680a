//! Fill styling for closed-ring shapes.

use super::SerializableColor;
use serde::{Deserialize, Serialize};

/// Hatch pattern drawn inside a rectangle or polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HatchPattern {
    /// No hatching.
    #[default]
    None,
    /// Parallel lines rising at 45 degrees.
    Diagonal,
    /// Both diagonals.
    Cross,
    /// Horizontal lines.
    Horizontal,
    /// Vertical lines.
    Vertical,
}

impl HatchPattern {
    /// Line directions (unit vectors in screen space) for this pattern.
    pub fn directions(self) -> &'static [(f64, f64)] {
        const D: f64 = std::f64::consts::FRAC_1_SQRT_2;
        match self {
            HatchPattern::None => &[],
            HatchPattern::Diagonal => &[(D, -D)],
            HatchPattern::Cross => &[(D, -D), (D, D)],
            HatchPattern::Horizontal => &[(1.0, 0.0)],
            HatchPattern::Vertical => &[(0.0, 1.0)],
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, HatchPattern::None)
    }
}

/// Fill properties shared by rectangles and polygons.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaStyle {
    /// Fill color (None = no fill).
    #[serde(default)]
    pub fill_color: Option<SerializableColor>,
    /// Hatch pattern drawn with the stroke color.
    #[serde(default, skip_serializing_if = "HatchPattern::is_none")]
    pub hatch_pattern: HatchPattern,
}

impl AreaStyle {
    pub fn new(fill_color: Option<SerializableColor>, hatch_pattern: HatchPattern) -> Self {
        Self {
            fill_color,
            hatch_pattern,
        }
    }
}
