//! The owning application: wires input through the active tool, the event
//! bus and the canonical shape list into scheduled redraws.

use crate::config::{ConfigError, EngineConfig, StyleConfig};
use crate::events::{EditorEvent, EventBus, EventFilter, EventReceiver, ViewportChange};
use crate::persist::{EditorState, PersistError};
use crate::projection::{MapView, MercatorViewport};
use crate::render_manager::RenderManager;
use crate::shapes::{Shape, ShapeId};
use crate::surface::{
    DrawBackend, FrameScheduler, FrameToken, IconError, IconImage, IconLoader, SurfaceManager,
};
use crate::tools::{IconDrop, PointerInput, ToolContext, ToolKey, ToolKind, ToolManager, place_sign};
use kurbo::{Point, Size};

/// Interactive annotation editor over one map view and one surface.
///
/// Tools only publish on the bus; the editor is the single place that
/// mutates the shape list, after each input event.
pub struct Editor<B: DrawBackend, V: MapView = MercatorViewport> {
    bus: EventBus,
    events: EventReceiver,
    scene: RenderManager,
    tools: ToolManager,
    viewport: V,
    surface: SurfaceManager<B>,
    config: EngineConfig,
}

impl<B: DrawBackend, V: MapView> Editor<B, V> {
    /// Build an editor with the Select tool active. Fails if `config` does
    /// not pass [`EngineConfig::validate`].
    pub fn new(
        backend: B,
        viewport: V,
        scheduler: Box<dyn FrameScheduler>,
        loader: Box<dyn IconLoader>,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let bus = EventBus::new();
        let events = bus.receiver(EventFilter::All);
        let mut tools = ToolManager::new();
        tools.set_active_tool(Some(ToolKind::Select));
        Ok(Self {
            bus,
            events,
            scene: RenderManager::new(),
            tools,
            viewport,
            surface: SurfaceManager::new(backend, scheduler, loader),
            config,
        })
    }

    /// Handle for external subscribers.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn shapes(&self) -> &[Shape] {
        self.scene.shapes()
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.scene.shape(id)
    }

    pub fn selected_id(&self) -> Option<ShapeId> {
        self.scene.selected_id()
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.scene.selected_shape()
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    /// Mutable access for the host's map bindings. Follow up with
    /// [`Editor::viewport_changed`] so the surface repaints.
    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn surface(&self) -> &SurfaceManager<B> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut SurfaceManager<B> {
        &mut self.surface
    }

    pub fn active_tool(&self) -> Option<ToolKind> {
        self.tools.active_kind()
    }

    pub fn style(&self) -> &StyleConfig {
        self.tools.style()
    }

    pub fn set_active_tool(&mut self, kind: Option<ToolKind>) {
        if self.tools.active_kind() == kind {
            return;
        }
        self.tools.set_active_tool(kind);
        self.surface.schedule_redraw();
    }

    /// Apply a style to the tools and write it through to the selected shape.
    pub fn set_style(&mut self, style: StyleConfig) {
        self.tools.update_style(&style);
        if self.scene.update_selected(|shape| shape.apply_style(&style)) {
            self.surface.schedule_redraw();
        }
    }

    pub fn set_sign_icon(&mut self, icon: Option<IconDrop>) {
        self.tools.set_sign_icon(icon);
    }

    pub fn pointer_down(&mut self, screen: Point) -> bool {
        let input = PointerInput::at(&self.viewport, screen);
        self.dispatch(|tools, ctx| tools.pointer_down(ctx, input))
    }

    pub fn pointer_move(&mut self, screen: Point) -> bool {
        let input = PointerInput::at(&self.viewport, screen);
        self.dispatch(|tools, ctx| tools.pointer_move(ctx, input))
    }

    pub fn pointer_up(&mut self, screen: Point) -> bool {
        let input = PointerInput::at(&self.viewport, screen);
        self.dispatch(|tools, ctx| tools.pointer_up(ctx, input))
    }

    pub fn double_click(&mut self, screen: Point) -> bool {
        let input = PointerInput::at(&self.viewport, screen);
        self.dispatch(|tools, ctx| tools.double_click(ctx, input))
    }

    pub fn key(&mut self, key: ToolKey) -> bool {
        self.dispatch(|tools, ctx| tools.key(ctx, key))
    }

    pub fn text_input(&mut self, text: &str) -> bool {
        self.dispatch(|tools, ctx| tools.text_input(ctx, text))
    }

    pub fn blur(&mut self) -> bool {
        self.dispatch(|tools, ctx| tools.blur(ctx))
    }

    /// Place a sign delivered by drag-and-drop at a screen point.
    pub fn drop_icon(&mut self, icon: &IconDrop, screen: Point) -> Result<ShapeId, IconError> {
        let at = self.viewport.unproject(screen);
        let id = place_sign(&self.bus, &self.config, self.tools.style(), icon, at)?;
        self.process_events();
        Ok(id)
    }

    /// Select a shape, or clear the selection.
    pub fn select(&mut self, id: Option<ShapeId>) -> bool {
        let changed = self.scene.select(id);
        if changed {
            self.surface.schedule_redraw();
        }
        changed
    }

    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.scene.selected_id() else {
            return false;
        };
        let removed = self.scene.remove_shape(id);
        if removed {
            self.surface.schedule_redraw();
        }
        removed
    }

    /// Replace a text shape's content from outside the canvas.
    pub fn update_text(&mut self, id: ShapeId, text: &str) -> bool {
        let Some(mut shape) = self.scene.shape(id).cloned() else {
            return false;
        };
        let Some(data) = shape.text_data_mut() else {
            log::warn!("shape {} is not text", id);
            return false;
        };
        data.text = text.to_string();
        let changed = self.scene.replace_shape(shape);
        if changed {
            self.surface.schedule_redraw();
        }
        changed
    }

    /// Notification from the map that the view changed.
    pub fn viewport_changed(&mut self, change: ViewportChange) {
        self.bus.publish(EditorEvent::ViewportChanged(change));
        self.process_events();
    }

    /// Container size change in logical pixels.
    pub fn resize(&mut self, size: Size, scale: f64) {
        self.viewport.resize(size);
        if self.surface.resize(size, scale) {
            self.bus
                .publish(EditorEvent::ViewportChanged(ViewportChange::Resize));
            self.process_events();
        }
    }

    pub fn state(&self) -> EditorState {
        self.scene.get_state()
    }

    /// Replace every shape and the selection. The active tool restarts so
    /// no interaction refers to a shape that no longer exists.
    pub fn load_state(&mut self, state: EditorState) {
        let kind = self.tools.active_kind();
        self.tools.set_active_tool(kind);
        if self.scene.set_state(state) {
            self.surface.schedule_redraw();
        }
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        self.state().to_json()
    }

    pub fn from_json(&mut self, json: &str) -> Result<(), PersistError> {
        let state = EditorState::from_json(json)?;
        self.load_state(state);
        Ok(())
    }

    /// Frame callback from the host scheduler.
    pub fn on_frame(&mut self, token: FrameToken) -> bool {
        self.surface
            .on_frame(token, &self.scene, &self.tools, &self.viewport, &self.config)
    }

    pub fn icon_loaded(&mut self, url: &str, result: Result<IconImage, IconError>) -> bool {
        self.surface.icon_loaded(url, result)
    }

    /// Render the drawing alone into `target`.
    pub fn export(&mut self, target: &mut dyn DrawBackend) {
        self.surface
            .export(target, &self.scene, &self.viewport, &self.config);
    }

    /// Drop the active tool and cancel any scheduled frame.
    pub fn teardown(&mut self) {
        self.tools.set_active_tool(None);
        self.surface.teardown();
        self.events.drain();
    }

    fn dispatch(&mut self, f: impl FnOnce(&mut ToolManager, &ToolContext) -> bool) -> bool {
        let ctx = ToolContext {
            projection: &self.viewport,
            shapes: self.scene.shapes(),
            selected: self.scene.selected_id(),
            bus: &self.bus,
            config: &self.config,
        };
        let overlay_changed = f(&mut self.tools, &ctx);
        let scene_changed = self.process_events();
        if overlay_changed && !scene_changed {
            self.surface.schedule_redraw();
        }
        overlay_changed || scene_changed
    }

    /// Apply queued bus events to the canonical state. Returns `true` if
    /// anything visible changed; a redraw is then already scheduled.
    fn process_events(&mut self) -> bool {
        let mut changed = false;
        for event in self.events.drain() {
            changed |= match event {
                EditorEvent::ShapeComplete(shape) => self.scene.add_shape(shape),
                EditorEvent::ShapeMove(shape) | EditorEvent::ShapeUpdate(shape) => {
                    self.scene.replace_shape(shape)
                }
                EditorEvent::ShapeDelete(id) => self.scene.remove_shape(id),
                EditorEvent::SelectionChange(id) => self.scene.select(id),
                EditorEvent::ViewportChanged(change) => {
                    if let ViewportChange::Recenter(center) = change {
                        self.viewport.recenter(center);
                    }
                    true
                }
            };
        }
        if changed {
            self.surface.schedule_redraw();
        }
        changed
    }
}

impl<B: DrawBackend, V: MapView> std::fmt::Debug for Editor<B, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("shapes", &self.scene.shapes().len())
            .field("selected", &self.scene.selected_id())
            .field("tools", &self.tools)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::surface::test_support::TagBackend;
    use crate::surface::{ManualScheduler, QueuedIconLoader};
    use crate::projection::Projection;

    fn editor() -> (Editor<TagBackend>, ManualScheduler) {
        let frames = ManualScheduler::new();
        let viewport = MercatorViewport::new(GeoPoint::new(0.0, 0.0), 10.0, Size::new(800.0, 600.0));
        let editor = Editor::new(
            TagBackend::default(),
            viewport,
            Box::new(frames.clone()),
            Box::new(QueuedIconLoader::new()),
            EngineConfig::default(),
        )
        .unwrap();
        (editor, frames)
    }

    #[test]
    fn test_starts_with_select_tool() {
        let (ed, _) = editor();
        assert_eq!(ed.active_tool(), Some(ToolKind::Select));
    }

    #[test]
    fn test_rectangle_via_drag() {
        let (mut ed, frames) = editor();
        ed.set_active_tool(Some(ToolKind::Rectangle));
        ed.pointer_down(Point::new(100.0, 100.0));
        ed.pointer_move(Point::new(200.0, 150.0));
        ed.pointer_up(Point::new(200.0, 150.0));
        assert_eq!(ed.shapes().len(), 1);
        assert_eq!(ed.shapes()[0].points.len(), 5);
        assert_eq!(frames.pending_len(), 1);
    }

    #[test]
    fn test_style_writes_through_to_selection() {
        let (mut ed, _) = editor();
        ed.set_active_tool(Some(ToolKind::Line));
        ed.pointer_down(Point::new(100.0, 100.0));
        ed.pointer_down(Point::new(300.0, 100.0));
        let id = ed.shapes()[0].id();
        ed.select(Some(id));

        let style = StyleConfig {
            line_color: crate::shapes::SerializableColor::new(0, 128, 0, 255),
            line_thickness: 6.0,
            ..StyleConfig::default()
        };
        ed.set_style(style.clone());
        let shape = ed.shape(id).unwrap();
        assert_eq!(shape.color, style.line_color);
        assert!((shape.thickness - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drop_icon_without_url_is_rejected() {
        let (mut ed, _) = editor();
        let err = ed.drop_icon(&IconDrop::new("  ", "Stop", None), Point::new(10.0, 10.0));
        assert_eq!(err, Err(IconError::MissingUrl));
        assert!(ed.shapes().is_empty());

        let id = ed
            .drop_icon(&IconDrop::new("stop.png", "Stop", Some(500.0)), Point::new(10.0, 10.0))
            .unwrap();
        let sign = ed.shape(id).unwrap().sign_data().unwrap();
        assert!((sign.size - 256.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan_recenters_viewport() {
        let (mut ed, _) = editor();
        ed.set_active_tool(Some(ToolKind::Pan));
        let before = ed.viewport().center();
        ed.pointer_down(Point::new(400.0, 300.0));
        ed.pointer_move(Point::new(450.0, 300.0));
        ed.pointer_up(Point::new(450.0, 300.0));
        let after = ed.viewport().center();
        assert!(after.lng < before.lng);
        assert!((after.lat - before.lat).abs() < 1e-9);
    }

    #[test]
    fn test_update_text_and_delete() {
        let (mut ed, _) = editor();
        ed.set_active_tool(Some(ToolKind::Text));
        ed.pointer_down(Point::new(400.0, 300.0));
        ed.text_input("Hello");
        ed.key(ToolKey::Enter);
        let id = ed.shapes()[0].id();

        assert!(ed.update_text(id, "Bye"));
        assert_eq!(ed.shape(id).unwrap().text_data().unwrap().text, "Bye");

        ed.select(Some(id));
        assert!(ed.delete_selected());
        assert!(ed.shapes().is_empty());
        assert_eq!(ed.selected_id(), None);
    }

    #[test]
    fn test_switching_tool_mid_edit_keeps_text() {
        let (mut ed, _) = editor();
        ed.set_active_tool(Some(ToolKind::Text));
        ed.pointer_down(Point::new(400.0, 300.0));
        ed.text_input("A");
        ed.key(ToolKey::Enter);
        let id = ed.shapes()[0].id();

        ed.set_active_tool(Some(ToolKind::Select));
        assert!(ed.double_click(Point::new(400.0, 300.0)));
        ed.key(ToolKey::Backspace);
        ed.text_input("Typed");
        assert_eq!(ed.shape(id).unwrap().text_data().unwrap().text, "A");

        ed.set_active_tool(Some(ToolKind::Line));
        let shape = ed.shape(id).unwrap();
        assert_eq!(shape.text_data().unwrap().text, "A");
        assert!(shape.validate().is_ok());
    }

    #[test]
    fn test_load_state_mid_edit_discards_buffer() {
        let (mut ed, _) = editor();
        ed.set_active_tool(Some(ToolKind::Text));
        ed.pointer_down(Point::new(400.0, 300.0));
        ed.text_input("Keep");
        ed.key(ToolKey::Enter);
        let state = ed.state();

        ed.set_active_tool(Some(ToolKind::Select));
        ed.double_click(Point::new(400.0, 300.0));
        ed.key(ToolKey::Backspace);
        ed.load_state(state.clone());
        ed.key(ToolKey::Enter);
        assert_eq!(ed.state(), state);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            sign_min_size: 300.0,
            ..EngineConfig::default()
        };
        let viewport = MercatorViewport::new(GeoPoint::new(0.0, 0.0), 10.0, Size::new(800.0, 600.0));
        let result = Editor::new(
            TagBackend::default(),
            viewport,
            Box::new(ManualScheduler::new()),
            Box::new(QueuedIconLoader::new()),
            config,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_teardown_cancels_pending_frame() {
        let (mut ed, frames) = editor();
        ed.viewport_changed(ViewportChange::Zoom);
        assert_eq!(frames.pending_len(), 1);
        ed.teardown();
        assert_eq!(frames.pending_len(), 0);
        assert_eq!(ed.active_tool(), None);
    }
}
