//! Vello scene backend.

use atlasink_core::DrawBackend;
use atlasink_core::shapes::TextAlign;
use atlasink_core::surface::IconImage;
use kurbo::{Affine, BezPath, Size, Stroke};
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, LayoutContext, StyleProperty};
use peniko::{Brush, Color, Fill, Mix};
use std::collections::HashMap;
use std::sync::Arc;
use vello::Scene;

struct CachedImage {
    data: peniko::ImageData,
    /// Drawn since the last `clear`.
    used: bool,
}

/// Builds a Vello [`Scene`] from surface draw calls.
pub struct VelloBackend {
    scene: Scene,
    font_cx: FontContext,
    layout_cx: LayoutContext<Brush>,
    /// Uploaded icons keyed by pixel buffer address. Each entry's blob
    /// holds the buffer, so an address cannot be reused while it is cached.
    images: HashMap<usize, CachedImage>,
    width: u32,
    height: u32,
    scale: f64,
    clip_depth: usize,
}

impl Default for VelloBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloBackend {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
            images: HashMap::new(),
            width: 0,
            height: 0,
            scale: 1.0,
            clip_depth: 0,
        }
    }

    /// Register font data used for labels in addition to system fonts.
    pub fn register_font(&mut self, data: Vec<u8>) {
        self.font_cx
            .collection
            .register_fonts(vello::peniko::Blob::new(Arc::new(data)), None);
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// Backing store size in device pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Number of icons currently uploaded.
    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    fn image_data(&mut self, image: &IconImage) -> peniko::ImageData {
        let key = Arc::as_ptr(&image.rgba) as usize;
        let entry = self.images.entry(key).or_insert_with(|| CachedImage {
            data: peniko::ImageData {
                data: peniko::Blob::new(image.rgba.clone()),
                format: peniko::ImageFormat::Rgba8,
                width: image.width,
                height: image.height,
                alpha_type: peniko::ImageAlphaType::Alpha,
            },
            used: false,
        });
        entry.used = true;
        entry.data.clone()
    }

    /// Drop icons the last frame did not draw.
    fn evict_unused_images(&mut self) {
        self.images.retain(|_, cached| std::mem::take(&mut cached.used));
    }
}

impl DrawBackend for VelloBackend {
    fn resize(&mut self, width: u32, height: u32, scale: f64) {
        self.width = width;
        self.height = height;
        self.scale = scale;
    }

    fn clear(&mut self) {
        self.scene.reset();
        self.clip_depth = 0;
        self.evict_unused_images();
    }

    fn stroke_path(&mut self, path: &BezPath, transform: Affine, stroke: &Stroke, color: Color) {
        self.scene.stroke(stroke, transform, color, None, path);
    }

    fn fill_path(&mut self, path: &BezPath, transform: Affine, color: Color) {
        self.scene.fill(Fill::NonZero, transform, color, None, path);
    }

    fn push_clip(&mut self, path: &BezPath, transform: Affine) {
        self.scene.push_layer(Mix::Normal, 1.0, transform, path);
        self.clip_depth += 1;
    }

    fn pop_clip(&mut self) {
        if self.clip_depth == 0 {
            log::warn!("pop_clip without matching push_clip");
            return;
        }
        self.clip_depth -= 1;
        self.scene.pop_layer();
    }

    fn draw_text(&mut self, text: &str, transform: Affine, size: f64, color: Color, align: TextAlign) {
        if text.is_empty() {
            return;
        }
        let brush = Brush::Solid(color);
        let mut builder = self.layout_cx.ranged_builder(&mut self.font_cx, text, 1.0, false);
        builder.push_default(StyleProperty::FontSize(size as f32));
        builder.push_default(StyleProperty::Brush(brush.clone()));
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Single(
            parley::FontFamily::Generic(parley::GenericFamily::SansSerif),
        )));
        let mut layout = builder.build(text);
        layout.break_all_lines(None);
        layout.align(None, parley::Alignment::Start, parley::AlignmentOptions::default());

        // Origin is the alignment point on the line's vertical middle.
        let width = layout.width() as f64;
        let height = layout.height() as f64;
        let text_transform =
            transform * Affine::translate((-width * align.anchor_factor(), -height / 2.0));

        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        vello::Glyph { id: glyph.id, x: gx, y: gy }
                    })
                    .collect();
                if glyphs.is_empty() {
                    continue;
                }
                self.scene
                    .draw_glyphs(run.font())
                    .brush(&brush)
                    .hint(true)
                    .transform(text_transform)
                    .font_size(run.font_size())
                    .normalized_coords(run.normalized_coords())
                    .draw(Fill::NonZero, glyphs.into_iter());
            }
        }
    }

    fn draw_image(&mut self, image: &IconImage, transform: Affine, size: Size) {
        if image.width == 0 || image.height == 0 {
            return;
        }
        let data = self.image_data(image);
        let image_transform = transform
            * Affine::scale_non_uniform(
                size.width / image.width as f64,
                size.height / image.height as f64,
            );
        self.scene.draw_image(&data.into(), image_transform);
    }
}
