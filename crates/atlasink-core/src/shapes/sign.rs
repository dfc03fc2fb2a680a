//! Icon marker data.

use serde::{Deserialize, Serialize};

/// Icon-specific shape fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignData {
    /// Image URL or path used as the icon cache key.
    #[serde(default)]
    pub url: String,
    /// Display name from the icon catalog.
    #[serde(default)]
    pub name: String,
    /// Edge length of the square icon in screen pixels.
    pub size: f64,
    /// Rotation in degrees, normalized to `[0, 360)`.
    #[serde(default)]
    pub rotation: f64,
}

impl SignData {
    pub fn new(url: impl Into<String>, name: impl Into<String>, size: f64) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            size,
            rotation: 0.0,
        }
    }

    /// Set the size, clamped into `[min, max]`.
    pub fn set_size_clamped(&mut self, size: f64, min: f64, max: f64) {
        self.size = clamp_size(size, min, max);
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        self.rotation = normalize_rotation(degrees);
    }
}

/// Clamp a size into `[min, max]`; non-finite input falls back to `min`.
/// Inverted bounds resolve to `min` instead of panicking.
pub fn clamp_size(size: f64, min: f64, max: f64) -> f64 {
    if !size.is_finite() {
        return min;
    }
    size.min(max).max(min)
}

/// Normalize a degree value into `[0, 360)`.
pub fn normalize_rotation(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let r = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negatives
    if r >= 360.0 { 0.0 } else { r }
}
