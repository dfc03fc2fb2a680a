//! [`GeoPainter`] over a [`DrawBackend`].

use super::DrawBackend;
use super::icons::IconCache;
use crate::config::EngineConfig;
use crate::geo::GeoPoint;
use crate::painter::{GeoPainter, arrowhead, hatch_lines, is_drawable_ring, polyline_path, rect_path};
use crate::projection::Projection;
use crate::shapes::{AreaStyle, SerializableColor, SignData, TextAlign, TextData, CHAR_WIDTH_FACTOR};
use kurbo::{Affine, BezPath, Cap, Join, Point, Rect, Shape as _, Size, Stroke};

/// Padding around a dimension label, in pixels.
const LABEL_PADDING: f64 = 4.0;

/// Re-projects geographic input and forwards screen paths to a backend.
///
/// Coordinates are in logical pixels; `base` maps them to device pixels.
pub struct SurfacePainter<'a> {
    backend: &'a mut dyn DrawBackend,
    projection: &'a dyn Projection,
    config: &'a EngineConfig,
    icons: &'a mut IconCache,
    base: Affine,
}

impl<'a> SurfacePainter<'a> {
    pub fn new(
        backend: &'a mut dyn DrawBackend,
        projection: &'a dyn Projection,
        config: &'a EngineConfig,
        icons: &'a mut IconCache,
        scale: f64,
    ) -> Self {
        Self {
            backend,
            projection,
            config,
            icons,
            base: Affine::scale(scale),
        }
    }

    fn project_all(&self, points: &[GeoPoint]) -> Vec<Point> {
        points.iter().map(|p| self.projection.project(*p)).collect()
    }

    fn line_stroke(width: f64) -> Stroke {
        Stroke::new(width).with_caps(Cap::Round).with_join(Join::Round)
    }
}

impl GeoPainter for SurfacePainter<'_> {
    fn projection(&self) -> &dyn Projection {
        self.projection
    }

    fn config(&self) -> &EngineConfig {
        self.config
    }

    fn draw_line(&mut self, points: &[GeoPoint], color: SerializableColor, width: f64) {
        if points.len() < 2 {
            return;
        }
        let path = polyline_path(&self.project_all(points), false);
        self.backend
            .stroke_path(&path, self.base, &Self::line_stroke(width), color.into());
    }

    fn draw_arrow(&mut self, from: GeoPoint, to: GeoPoint, color: SerializableColor, width: f64) {
        let (a, b) = (self.projection.project(from), self.projection.project(to));
        let mut path = polyline_path(&[a, b], false);
        let head = arrowhead(a, b, self.config.arrowhead_length, self.config.arrowhead_angle);
        path.extend(head.elements().iter().copied());
        self.backend
            .stroke_path(&path, self.base, &Self::line_stroke(width), color.into());
    }

    fn draw_polygon(
        &mut self,
        ring: &[GeoPoint],
        color: SerializableColor,
        width: f64,
        area: &AreaStyle,
    ) {
        if !is_drawable_ring(ring) {
            return;
        }
        let mut screen = self.project_all(ring);
        if screen.first() == screen.last() {
            screen.pop();
        }
        let path = polyline_path(&screen, true);

        if let Some(fill) = area.fill_color {
            self.backend.fill_path(&path, self.base, fill.into());
        }
        if !area.hatch_pattern.is_none() {
            let hatch = hatch_lines(
                path.bounding_box(),
                area.hatch_pattern,
                self.config.hatch_spacing,
            );
            self.backend.push_clip(&path, self.base);
            self.backend
                .stroke_path(&hatch, self.base, &Stroke::new(1.0), color.into());
            self.backend.pop_clip();
        }
        self.backend
            .stroke_path(&path, self.base, &Self::line_stroke(width), color.into());
    }

    fn draw_dimension_line(
        &mut self,
        from: GeoPoint,
        to: GeoPoint,
        label: &str,
        color: SerializableColor,
        width: f64,
    ) {
        let (a, b) = (self.projection.project(from), self.projection.project(to));
        let (len, angle) = (self.config.arrowhead_length, self.config.arrowhead_angle);
        let mut path = polyline_path(&[a, b], false);
        for head in [arrowhead(a, b, len, angle), arrowhead(b, a, len, angle)] {
            path.extend(head.elements().iter().copied());
        }
        self.backend
            .stroke_path(&path, self.base, &Self::line_stroke(width), color.into());

        if label.is_empty() {
            return;
        }
        let font = self.config.dimension_font_size;
        let mid = a.midpoint(b);
        let text_width = label.chars().count() as f64 * font * CHAR_WIDTH_FACTOR;
        let backing = Rect::from_center_size(mid, (text_width, font))
            .inflate(LABEL_PADDING, LABEL_PADDING / 2.0);
        self.backend
            .fill_path(&rect_path(backing), self.base, SerializableColor::white().into());
        self.backend.draw_text(
            label,
            self.base * Affine::translate(mid.to_vec2()),
            font,
            color.into(),
            TextAlign::Center,
        );
    }

    fn draw_text(&mut self, anchor: GeoPoint, text: &TextData) {
        if text.text.is_empty() {
            return;
        }
        let at = self.projection.project(anchor);
        let frame = self.base
            * Affine::translate(at.to_vec2())
            * Affine::rotate(text.rotation.to_radians());

        let bounds = rect_path(text.local_bounds());
        if let Some(fill) = text.fill_color {
            self.backend.fill_path(&bounds, frame, fill.into());
        }
        if let Some(border) = text.border_color {
            self.backend
                .stroke_path(&bounds, frame, &Stroke::new(1.0), border.into());
        }
        for (line, dy) in text.lines().into_iter().zip(text.line_offsets()) {
            if line.is_empty() {
                continue;
            }
            self.backend.draw_text(
                line,
                frame * Affine::translate((0.0, dy)),
                text.size,
                text.font_color.into(),
                text.alignment,
            );
        }
    }

    fn draw_sign(&mut self, anchor: GeoPoint, sign: &SignData) {
        let Some(image) = self.icons.request(&sign.url) else {
            return;
        };
        let at = self.projection.project(anchor);
        let half = sign.size / 2.0;
        let frame = self.base
            * Affine::translate(at.to_vec2())
            * Affine::rotate(sign.rotation.to_radians())
            * Affine::translate((-half, -half));
        self.backend
            .draw_image(image, frame, Size::new(sign.size, sign.size));
    }

    fn stroke_screen(&mut self, path: &BezPath, color: SerializableColor, stroke: &Stroke) {
        self.backend.stroke_path(path, self.base, stroke, color.into());
    }

    fn fill_screen(&mut self, path: &BezPath, color: SerializableColor) {
        self.backend.fill_path(path, self.base, color.into());
    }
}
