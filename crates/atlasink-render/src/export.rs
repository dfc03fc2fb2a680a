//! Headless export of a saved drawing to a [`DisplayList`].

use crate::display_list::DisplayList;
use crate::icons::{load_icon_file, resolve_icon_path};
use crate::renderer::RenderResult;
use atlasink_core::{
    Editor, EditorState, EngineConfig, GeoPoint, ManualScheduler, MercatorViewport,
    QueuedIconLoader,
};
use kurbo::Size;
use std::path::PathBuf;

/// Where and how to frame the exported drawing.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Output size in logical pixels.
    pub size: Size,
    /// Device pixel ratio.
    pub scale: f64,
    /// Margin kept around the drawing when fitting the view.
    pub padding: f64,
    /// Fixed view; when `None` the view is fitted to the shapes.
    pub view: Option<(GeoPoint, f64)>,
    /// Directory that relative icon urls are resolved against.
    pub icon_dir: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            size: Size::new(1024.0, 768.0),
            scale: 1.0,
            padding: 32.0,
            view: None,
            icon_dir: PathBuf::from("."),
        }
    }
}

/// Render every shape of `state` without selection UI.
///
/// Sign icons are loaded from disk after the first pass; if any became
/// available the drawing is exported a second time. Icons that fail to
/// load are logged and left out.
pub fn export_state(
    state: EditorState,
    config: EngineConfig,
    options: &ExportOptions,
) -> RenderResult<DisplayList> {
    config.validate()?;
    let mut viewport = MercatorViewport::new(GeoPoint::default(), 0.0, options.size);
    match options.view {
        Some((center, zoom)) => {
            viewport.set_center(center);
            viewport.set_zoom(zoom);
        }
        None => {
            let points: Vec<GeoPoint> = state.shapes.iter().flat_map(|s| s.points.clone()).collect();
            viewport.fit_to(&points, options.padding);
        }
    }

    let loader = QueuedIconLoader::new();
    let mut editor = Editor::new(
        DisplayList::new(),
        viewport,
        Box::new(ManualScheduler::new()),
        Box::new(loader.clone()),
        config,
    )?;
    editor.resize(options.size, options.scale);
    editor.load_state(state);

    let mut output = DisplayList::new();
    editor.export(&mut output);

    let mut loaded = false;
    for url in loader.take_pending() {
        let result = resolve_icon_path(&url, &options.icon_dir).and_then(load_icon_file);
        loaded |= editor.icon_loaded(&url, result);
    }
    if loaded {
        editor.export(&mut output);
    }
    editor.teardown();

    log::info!(
        "exported {} commands at {}x{}",
        output.len(),
        output.width,
        output.height
    );
    Ok(output)
}
