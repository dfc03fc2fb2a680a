//! Drawing surface: backend abstraction, frame-coalesced redraw and the
//! sign icon cache.
//!
//! The surface never repaints synchronously in response to a mutation.
//! [`SurfaceManager::schedule_redraw`] marks the surface dirty and asks the
//! host's [`FrameScheduler`] for one frame callback; further requests before
//! that frame fires are absorbed. The host delivers the frame through
//! [`SurfaceManager::on_frame`].

mod icons;
mod painter;

pub use icons::{IconCache, IconError, IconImage, IconLoader, QueuedIconLoader};
pub use painter::SurfacePainter;

use crate::config::EngineConfig;
use crate::projection::Projection;
use crate::render_manager::RenderManager;
use crate::shapes::TextAlign;
use crate::tools::ToolManager;
use kurbo::{Affine, BezPath, Size, Stroke};
use peniko::Color;
use std::cell::RefCell;
use std::rc::Rc;

/// Screen-space drawing sink. Paths are in logical pixels and `transform`
/// maps them to device pixels.
pub trait DrawBackend {
    /// Resize the backing store, in device pixels.
    fn resize(&mut self, width: u32, height: u32, scale: f64);

    /// Discard everything drawn since the last clear.
    fn clear(&mut self);

    fn stroke_path(&mut self, path: &BezPath, transform: Affine, stroke: &Stroke, color: Color);

    fn fill_path(&mut self, path: &BezPath, transform: Affine, color: Color);

    /// Restrict drawing to the inside of `path` until the matching pop.
    fn push_clip(&mut self, path: &BezPath, transform: Affine);

    fn pop_clip(&mut self);

    /// One line of text. The transform's origin is the alignment point on
    /// the line's vertical middle.
    fn draw_text(&mut self, text: &str, transform: Affine, size: f64, color: Color, align: TextAlign);

    /// Image stretched over `(0, 0)..size` in the transformed frame.
    fn draw_image(&mut self, image: &IconImage, transform: Affine, size: Size);
}

/// Handle for one requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Host hook for the next display-frame boundary.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

#[derive(Debug, Default)]
struct ManualQueue {
    next: u64,
    pending: Vec<FrameToken>,
}

/// Scheduler driven by hand, for headless use and tests. Clones share the
/// queue, so a host can keep one copy and hand the other to the surface.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<ManualQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens whose frame is due, oldest first. Clears the queue.
    pub fn due(&self) -> Vec<FrameToken> {
        std::mem::take(&mut self.queue.borrow_mut().pending)
    }

    pub fn pending_len(&self) -> usize {
        self.queue.borrow().pending.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        let mut queue = self.queue.borrow_mut();
        queue.next += 1;
        let token = FrameToken(queue.next);
        queue.pending.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.queue.borrow_mut().pending.retain(|t| *t != token);
    }
}

/// Owns the live backend, its size and the redraw schedule.
pub struct SurfaceManager<B: DrawBackend> {
    backend: B,
    scheduler: Box<dyn FrameScheduler>,
    icons: IconCache,
    size: Size,
    scale: f64,
    dirty: bool,
    token: Option<FrameToken>,
    repaint_count: u64,
    torn_down: bool,
}

impl<B: DrawBackend> SurfaceManager<B> {
    pub fn new(backend: B, scheduler: Box<dyn FrameScheduler>, loader: Box<dyn IconLoader>) -> Self {
        Self {
            backend,
            scheduler,
            icons: IconCache::new(loader),
            size: Size::ZERO,
            scale: 1.0,
            dirty: false,
            token: None,
            repaint_count: 0,
            torn_down: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn icons(&self) -> &IconCache {
        &self.icons
    }

    /// Logical size in CSS-style pixels.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Device pixel ratio.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.token
    }

    /// Number of repaints performed so far.
    pub fn repaint_count(&self) -> u64 {
        self.repaint_count
    }

    /// Track a new container size and pixel ratio. Returns `true` if either
    /// changed, in which case a redraw has been scheduled.
    pub fn resize(&mut self, size: Size, scale: f64) -> bool {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let size = Size::new(size.width.max(0.0), size.height.max(0.0));
        if size == self.size && scale == self.scale {
            return false;
        }
        self.size = size;
        self.scale = scale;
        let (w, h) = device_size(size, scale);
        log::debug!("surface resized to {}x{} @{}", w, h, scale);
        self.backend.resize(w, h, scale);
        self.schedule_redraw();
        true
    }

    /// Ask for a repaint at the next frame boundary. A no-op while a frame
    /// is already outstanding.
    pub fn schedule_redraw(&mut self) {
        if self.torn_down {
            return;
        }
        self.dirty = true;
        if self.token.is_none() {
            let token = self.scheduler.request_frame();
            log::trace!("redraw scheduled for {:?}", token);
            self.token = Some(token);
        }
    }

    /// Frame callback from the host. Repaints if `token` is the outstanding
    /// one; stale or cancelled tokens are ignored.
    pub fn on_frame(
        &mut self,
        token: FrameToken,
        scene: &RenderManager,
        tools: &ToolManager,
        projection: &dyn Projection,
        config: &EngineConfig,
    ) -> bool {
        if self.token != Some(token) {
            log::debug!("ignoring stale frame {:?}", token);
            return false;
        }
        self.token = None;
        self.dirty = false;
        self.redraw(scene, tools, projection, config);
        true
    }

    /// Repaint now: clear, committed shapes, then the active tool's overlay.
    pub fn redraw(
        &mut self,
        scene: &RenderManager,
        tools: &ToolManager,
        projection: &dyn Projection,
        config: &EngineConfig,
    ) {
        self.backend.clear();
        let mut painter =
            SurfacePainter::new(&mut self.backend, projection, config, &mut self.icons, self.scale);
        scene.render_without(&mut painter, tools.hidden_shape());
        tools.draw_overlay(&mut painter);
        self.repaint_count += 1;
    }

    /// Completion of an icon load started during a repaint. A newly
    /// drawable icon schedules one follow-up redraw.
    pub fn icon_loaded(&mut self, url: &str, result: Result<IconImage, IconError>) -> bool {
        let ready = self.icons.resolve(url, result);
        if ready {
            self.schedule_redraw();
        }
        ready
    }

    /// Render all shapes into `target` without selection UI or tool
    /// overlay, synchronously.
    pub fn export(
        &mut self,
        target: &mut dyn DrawBackend,
        scene: &RenderManager,
        projection: &dyn Projection,
        config: &EngineConfig,
    ) {
        let (w, h) = device_size(self.size, self.scale);
        target.resize(w, h, self.scale);
        target.clear();
        let mut painter = SurfacePainter::new(target, projection, config, &mut self.icons, self.scale);
        scene.render_export(&mut painter);
    }

    /// Cancel any outstanding frame. Later schedules are ignored.
    pub fn teardown(&mut self) {
        if let Some(token) = self.token.take() {
            log::debug!("cancelling frame {:?} on teardown", token);
            self.scheduler.cancel_frame(token);
        }
        self.dirty = false;
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

fn device_size(size: Size, scale: f64) -> (u32, u32) {
    (
        (size.width * scale).round() as u32,
        (size.height * scale).round() as u32,
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Backend that logs each call as a short tag.
    #[derive(Debug, Default)]
    pub struct TagBackend {
        pub calls: Vec<String>,
        pub device: (u32, u32),
    }

    impl DrawBackend for TagBackend {
        fn resize(&mut self, width: u32, height: u32, _scale: f64) {
            self.device = (width, height);
        }
        fn clear(&mut self) {
            self.calls.clear();
            self.calls.push("clear".into());
        }
        fn stroke_path(&mut self, _: &BezPath, _: Affine, _: &Stroke, _: Color) {
            self.calls.push("stroke".into());
        }
        fn fill_path(&mut self, _: &BezPath, _: Affine, _: Color) {
            self.calls.push("fill".into());
        }
        fn push_clip(&mut self, _: &BezPath, _: Affine) {
            self.calls.push("clip".into());
        }
        fn pop_clip(&mut self) {
            self.calls.push("unclip".into());
        }
        fn draw_text(&mut self, text: &str, _: Affine, _: f64, _: Color, _: TextAlign) {
            self.calls.push(format!("text:{text}"));
        }
        fn draw_image(&mut self, _: &IconImage, _: Affine, size: Size) {
            self.calls.push(format!("image:{}", size.width));
        }
    }
}
