//! Slide rasterization onto a tiny-skia pixmap.

use crate::font::{FontRequest, FontSource, TextMeasure};
use crate::layout::{layout_body, PlacedToken};
use deck_core::{
    DashStyle, Error, Geometry, LineJoin, PxRect, Result, Rgb, RunStyle, Shape, ShapeKind,
    SlideSize, Stroke, TextBody, UnderlineKind,
};
use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect,
    StrokeDash, Transform,
};

/// Rounded rectangle corner radius as a fraction of the shorter side.
const CORNER_RADIUS_RATIO: f32 = 0.08;

const UNDERLINE_OFFSET: f32 = 0.12;
const DOUBLE_UNDERLINE_GAP: f32 = 0.08;
const STRIKE_OFFSET: f32 = 0.35;
const DECORATION_WIDTH: f32 = 0.06;

/// Draws slide shapes at a fixed supersampling scale.
pub struct SlideRasterizer<'a> {
    fonts: &'a dyn FontSource,
    scale: f32,
    background: Rgb,
}

impl<'a> SlideRasterizer<'a> {
    pub fn new(fonts: &'a dyn FontSource, scale: f32, background: Rgb) -> Self {
        Self {
            fonts,
            scale,
            background,
        }
    }

    /// Allocate a blank surface for a slide.
    pub fn surface(&self, size: SlideSize) -> Result<Pixmap> {
        let (width, height) = size.to_pixels(self.scale);
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            Error::UnsupportedEnvironment(format!(
                "Cannot allocate a {}x{} rendering surface",
                width, height
            ))
        })?;
        pixmap.fill(sk_color(self.background));
        Ok(pixmap)
    }

    /// Render shapes: geometry first, then pictures, then all text.
    pub fn render(&self, shapes: &[Shape], size: SlideSize) -> Result<Pixmap> {
        let mut pixmap = self.surface(size)?;
        let drawable = || shapes.iter().filter(|s| s.transform.is_drawable());

        for shape in drawable() {
            if let ShapeKind::AutoShape { geometry, .. } = &shape.kind {
                self.draw_geometry(&mut pixmap, shape, *geometry);
            }
        }

        for shape in drawable() {
            if let ShapeKind::Picture { rel_id, image } = &shape.kind {
                self.draw_picture(&mut pixmap, shape, rel_id, image);
            }
        }

        for shape in drawable() {
            if let Some(body) = shape.text_body() {
                self.draw_text(&mut pixmap, shape, body);
            }
        }

        Ok(pixmap)
    }

    fn rotation(&self, shape: &Shape, rect: &PxRect) -> Transform {
        if shape.rotation == 0.0 {
            return Transform::identity();
        }
        let (cx, cy) = rect.center();
        Transform::from_rotate_at(shape.rotation.to_degrees(), cx, cy)
    }

    fn draw_geometry(&self, pixmap: &mut Pixmap, shape: &Shape, geometry: Geometry) {
        if shape.fill.is_none() && shape.stroke.is_none() {
            return;
        }
        let rect = shape.transform.to_px(self.scale);
        let Some(path) = geometry_path(geometry, &rect) else {
            return;
        };
        let transform = self.rotation(shape, &rect);

        if let Some(fill) = shape.fill {
            pixmap.fill_path(&path, &paint(fill), FillRule::Winding, transform, None);
        }
        if let Some(stroke) = &shape.stroke {
            pixmap.stroke_path(&path, &paint(stroke.color), &sk_stroke(stroke), transform, None);
        }
    }

    fn draw_picture(&self, pixmap: &mut Pixmap, shape: &Shape, rel_id: &str, data: &[u8]) {
        let Some(image) = decode_image(data) else {
            log::warn!("Skipping picture {}: image data could not be decoded", rel_id);
            return;
        };
        let rect = shape.transform.to_px(self.scale);
        let placement = Transform::from_row(
            rect.width / image.width() as f32,
            0.0,
            0.0,
            rect.height / image.height() as f32,
            rect.x,
            rect.y,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        pixmap.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            self.rotation(shape, &rect).pre_concat(placement),
            None,
        );
    }

    fn draw_text(&self, pixmap: &mut Pixmap, shape: &Shape, body: &TextBody) {
        let rect = shape.transform.to_px(self.scale);
        let layout = layout_body(body, rect.width, rect.height, &Metrics(self.fonts));
        let transform = self.rotation(shape, &rect);

        for placed in &layout.placed {
            self.draw_token(pixmap, placed, rect.x, rect.y, transform);
        }
    }

    fn draw_token(
        &self,
        pixmap: &mut Pixmap,
        placed: &PlacedToken,
        origin_x: f32,
        origin_y: f32,
        transform: Transform,
    ) {
        let token = &placed.token;
        let style = &token.style;
        let x = origin_x + placed.x;
        let baseline = origin_y + placed.baseline;

        if !token.is_whitespace {
            if let Some(glyphs) = self
                .fonts
                .outline(&token.text, FontRequest::from(style), x, baseline)
            {
                if let Some(outline) = &style.outline {
                    let stroke = tiny_skia::Stroke {
                        width: outline.width,
                        ..tiny_skia::Stroke::default()
                    };
                    pixmap.stroke_path(&glyphs.path, &paint(outline.color), &stroke, transform, None);
                }
                let fill = paint(style.color);
                pixmap.fill_path(&glyphs.path, &fill, FillRule::Winding, transform, None);
                if glyphs.embolden > 0.0 {
                    let stroke = tiny_skia::Stroke {
                        width: glyphs.embolden,
                        ..tiny_skia::Stroke::default()
                    };
                    pixmap.stroke_path(&glyphs.path, &fill, &stroke, transform, None);
                }
            }
        }

        for (y, color) in decorations(style, token.is_whitespace) {
            let line_y = baseline + y;
            draw_line(pixmap, x, x + token.width, line_y, color, decoration_width(style), transform);
        }
    }
}

/// Adapts a font source for layout, which only needs metrics.
struct Metrics<'a>(&'a dyn FontSource);

impl TextMeasure for Metrics<'_> {
    fn measure(&self, text: &str, font: FontRequest) -> f32 {
        self.0.measure(text, font)
    }
}

/// Decoration lines of a token as (offset from baseline, color).
fn decorations(style: &RunStyle, is_whitespace: bool) -> Vec<(f32, Rgb)> {
    let mut lines = Vec::new();
    let size = style.font_size;
    let underline = style.underline;

    if underline != UnderlineKind::None && !(underline.words_only() && is_whitespace) {
        let first = size * UNDERLINE_OFFSET;
        lines.push((first, style.underline_color));
        if underline.is_double() {
            lines.push((first + size * DOUBLE_UNDERLINE_GAP, style.underline_color));
        }
    }
    if style.strike && !is_whitespace {
        lines.push((-size * STRIKE_OFFSET, style.strike_color));
    }
    lines
}

fn decoration_width(style: &RunStyle) -> f32 {
    (style.font_size * DECORATION_WIDTH).max(1.0)
}

fn draw_line(
    pixmap: &mut Pixmap,
    x1: f32,
    x2: f32,
    y: f32,
    color: Rgb,
    width: f32,
    transform: Transform,
) {
    let mut builder = PathBuilder::new();
    builder.move_to(x1, y);
    builder.line_to(x2, y);
    let Some(path) = builder.finish() else {
        return;
    };
    let stroke = tiny_skia::Stroke {
        width,
        ..tiny_skia::Stroke::default()
    };
    pixmap.stroke_path(&path, &paint(color), &stroke, transform, None);
}

fn geometry_path(geometry: Geometry, rect: &PxRect) -> Option<Path> {
    let bounds = Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)?;
    match geometry {
        Geometry::Rect => Some(PathBuilder::from_rect(bounds)),
        Geometry::Ellipse => PathBuilder::from_oval(bounds),
        Geometry::RoundRect => {
            let r = rect.width.min(rect.height) * CORNER_RADIUS_RATIO;
            let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
            let mut pb = PathBuilder::new();
            pb.move_to(x + r, y);
            pb.line_to(x + w - r, y);
            pb.quad_to(x + w, y, x + w, y + r);
            pb.line_to(x + w, y + h - r);
            pb.quad_to(x + w, y + h, x + w - r, y + h);
            pb.line_to(x + r, y + h);
            pb.quad_to(x, y + h, x, y + h - r);
            pb.line_to(x, y + r);
            pb.quad_to(x, y, x + r, y);
            pb.close();
            pb.finish()
        }
    }
}

fn sk_stroke(stroke: &Stroke) -> tiny_skia::Stroke {
    let mut sk = tiny_skia::Stroke {
        width: stroke.width,
        line_join: match stroke.join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        },
        ..tiny_skia::Stroke::default()
    };
    if stroke.dash != DashStyle::Solid {
        sk.dash = StrokeDash::new(stroke.dash.pattern(stroke.width), 0.0);
    }
    sk
}

fn sk_color(color: Rgb) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, 255)
}

fn paint(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(sk_color(color));
    paint.anti_alias = true;
    paint
}

/// Decode png, jpeg, gif or bmp bytes into a premultiplied pixmap.
fn decode_image(data: &[u8]) -> Option<Pixmap> {
    let decoded = image::load_from_memory(data).ok()?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)?;
    for (src, dst) in rgba
        .as_raw()
        .chunks_exact(4)
        .zip(pixmap.data_mut().chunks_exact_mut(4))
    {
        let alpha = src[3];
        dst[0] = premultiply(src[0], alpha);
        dst[1] = premultiply(src[1], alpha);
        dst[2] = premultiply(src[2], alpha);
        dst[3] = alpha;
    }
    Some(pixmap)
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    let product = channel as u16 * alpha as u16 + 127;
    ((product + (product >> 8)) >> 8) as u8
}
