//! Sign placement: by click with a configured icon, or by drop.

use super::{PointerInput, Tool, ToolContext, ToolKind};
use crate::config::{EngineConfig, StyleConfig};
use crate::events::{EditorEvent, EventBus};
use crate::geo::GeoPoint;
use crate::shapes::{Shape, ShapeId, SignData, clamp_size};
use crate::surface::IconError;
use serde::{Deserialize, Serialize};

/// Icon metadata delivered by the catalog, by drag-and-drop or configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconDrop {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name: String,
    /// Default edge length in pixels; the configured default when absent.
    #[serde(default)]
    pub size: Option<f64>,
}

impl IconDrop {
    pub fn new(url: impl Into<String>, name: impl Into<String>, size: Option<f64>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            size,
        }
    }
}

/// Create a sign shape for `icon` at `at` and publish it.
///
/// A missing url is rejected without creating anything.
pub fn place_sign(
    bus: &EventBus,
    config: &EngineConfig,
    style: &StyleConfig,
    icon: &IconDrop,
    at: GeoPoint,
) -> Result<ShapeId, IconError> {
    let url = icon.url.trim();
    if url.is_empty() {
        return Err(IconError::MissingUrl);
    }
    let size = clamp_size(
        icon.size.unwrap_or(config.sign_default_size),
        config.sign_min_size,
        config.sign_max_size,
    );
    let shape = Shape::sign(at, SignData::new(url, icon.name.clone(), size)).with_style(style);
    let id = shape.id();
    log::debug!("sign placed: {} ({})", id, url);
    bus.publish(EditorEvent::ShapeComplete(shape));
    Ok(id)
}

#[derive(Debug, Default)]
pub struct SignTool {
    style: StyleConfig,
    icon: Option<IconDrop>,
}

impl SignTool {
    pub fn new(icon: Option<IconDrop>) -> Self {
        Self {
            style: StyleConfig::default(),
            icon,
        }
    }
}

impl Tool for SignTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Sign
    }

    fn deactivate(&mut self) {}

    fn update_style(&mut self, style: &StyleConfig) {
        self.style = style.clone();
    }

    fn set_icon(&mut self, icon: Option<IconDrop>) {
        self.icon = icon;
    }

    fn pointer_down(&mut self, ctx: &ToolContext, input: PointerInput) -> bool {
        let Some(icon) = self.icon.as_ref() else {
            log::warn!("sign tool clicked with no icon configured");
            return false;
        };
        match place_sign(ctx.bus, ctx.config, &self.style, icon, input.geo) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("cannot place sign: {e}");
                false
            }
        }
    }

    fn is_capturing(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{Harness, at};

    #[test]
    fn test_click_places_configured_icon() {
        let mut h = Harness::new();
        let mut tool = SignTool::new(Some(IconDrop::new("signs/stop.png", "Stop", Some(300.0))));
        assert!(tool.pointer_down(&h.ctx(), at(5.0, 6.0)));
        h.apply();
        let sign = h.shapes[0].sign_data().unwrap();
        assert_eq!(sign.url, "signs/stop.png");
        assert_eq!(sign.name, "Stop");
        assert!((sign.size - 256.0).abs() < f64::EPSILON);
        assert_eq!(h.shapes[0].points, vec![GeoPoint::new(5.0, 6.0)]);
    }

    #[test]
    fn test_click_without_icon_does_nothing() {
        let mut h = Harness::new();
        let mut tool = SignTool::new(None);
        assert!(!tool.pointer_down(&h.ctx(), at(5.0, 6.0)));
        assert!(h.apply().is_empty());
    }

    #[test]
    fn test_missing_url_rejected() {
        let h = Harness::new();
        let drop: IconDrop = serde_json::from_str(r#"{"name":"Yield","size":48}"#).unwrap();
        let err = place_sign(&h.bus, &h.config, &StyleConfig::default(), &drop, GeoPoint::default());
        assert!(matches!(err, Err(IconError::MissingUrl)));
        assert!(h.rx.is_empty());
    }

    #[test]
    fn test_default_size_applies() {
        let mut h = Harness::new();
        let drop = IconDrop::new("yield.png", "Yield", None);
        place_sign(&h.bus, &h.config, &StyleConfig::default(), &drop, GeoPoint::default()).unwrap();
        h.apply();
        assert!((h.shapes[0].sign_data().unwrap().size - 64.0).abs() < f64::EPSILON);
    }
}
