//! Engine tunables and the current drawing style.

use crate::geo::Units;
use crate::shapes::{HatchPattern, SerializableColor, TextAlign};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Tunable constants for interaction, hit-testing and drawing.
///
/// All distances are in screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Edge length of square handles and diameter of round ones.
    pub handle_size: f64,
    /// Pointer distance within which a handle counts as hit.
    pub handle_tolerance: f64,
    /// Distance of the rotate handle above the shape's top edge.
    pub rotate_handle_offset: f64,
    /// Maximum distance for picking a shape with the select tool.
    pub selection_threshold: f64,
    pub sign_min_size: f64,
    pub sign_max_size: f64,
    pub sign_default_size: f64,
    pub text_min_size: f64,
    pub text_max_size: f64,
    /// Gap between hatch lines.
    pub hatch_spacing: f64,
    pub arrowhead_length: f64,
    /// Half-angle between shaft and each arrowhead wing, in radians.
    pub arrowhead_angle: f64,
    /// Minimum distance between consecutive freehand samples.
    pub freehand_min_distance: f64,
    /// Width of the freehand moving-average window.
    pub freehand_smoothing_window: usize,
    /// Drag distance below which a press-release counts as a click.
    pub drag_threshold: f64,
    pub units: Units,
    pub selection_color: SerializableColor,
    pub dimension_font_size: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            handle_size: 10.0,
            handle_tolerance: 8.0,
            rotate_handle_offset: 30.0,
            selection_threshold: 10.0,
            sign_min_size: 32.0,
            sign_max_size: 256.0,
            sign_default_size: 64.0,
            text_min_size: 8.0,
            text_max_size: 200.0,
            hatch_spacing: 8.0,
            arrowhead_length: 15.0,
            arrowhead_angle: std::f64::consts::FRAC_PI_6,
            freehand_min_distance: 3.0,
            freehand_smoothing_window: 5,
            drag_threshold: 1.0,
            units: Units::Imperial,
            selection_color: SerializableColor::new(0, 120, 255, 255),
            dimension_font_size: 12.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("handleSize", self.handle_size),
            ("handleTolerance", self.handle_tolerance),
            ("selectionThreshold", self.selection_threshold),
            ("hatchSpacing", self.hatch_spacing),
            ("signMinSize", self.sign_min_size),
            ("textMinSize", self.text_min_size),
            ("dimensionFontSize", self.dimension_font_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.sign_min_size > self.sign_max_size {
            return Err(ConfigError::Invalid("signMinSize exceeds signMaxSize".into()));
        }
        if self.text_min_size > self.text_max_size {
            return Err(ConfigError::Invalid("textMinSize exceeds textMaxSize".into()));
        }
        if !(self.sign_min_size..=self.sign_max_size).contains(&self.sign_default_size) {
            return Err(ConfigError::Invalid("signDefaultSize outside sign size range".into()));
        }
        if self.freehand_smoothing_window == 0 {
            return Err(ConfigError::Invalid("freehandSmoothingWindow must be at least 1".into()));
        }
        Ok(())
    }
}

/// Current drawing style, applied to new shapes and written through to the
/// selected one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    pub line_color: SerializableColor,
    pub fill_color: Option<SerializableColor>,
    pub font_color: SerializableColor,
    pub line_thickness: f64,
    pub font_size: f64,
    pub text_alignment: TextAlign,
    pub hatch_pattern: HatchPattern,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            line_color: SerializableColor::new(220, 38, 38, 255),
            fill_color: None,
            font_color: SerializableColor::black(),
            line_thickness: 3.0,
            font_size: 16.0,
            text_alignment: TextAlign::Center,
            hatch_pattern: HatchPattern::None,
        }
    }
}
