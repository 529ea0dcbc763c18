//! CPU rasteriser backed by tiny-skia.

use perspective_core::{DrawOp, Frame, LineCap, Point, Rgba, Segment, StrokeStyle};
use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash,
    Transform,
};

use super::RenderBackend;
use crate::error::{RenderError, RenderResult};
use crate::image::ReferenceImage;

/// Allocate a pixmap, treating zero dimensions as one pixel.
///
/// # Errors
///
/// Returns an error if the size overflows what tiny-skia can allocate.
pub fn new_pixmap(width: u32, height: u32) -> RenderResult<Pixmap> {
    Pixmap::new(width.max(1), height.max(1))
        .ok_or_else(|| RenderError::Surface(format!("Failed to create {width}x{height} pixmap")))
}

/// Pixel dimensions for a frame surface.
#[must_use]
pub fn frame_pixels(frame: &Frame) -> (u32, u32) {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let to_px = |v: f64| v.round().clamp(1.0, f64::from(u32::MAX)) as u32;
    (to_px(frame.size.width), to_px(frame.size.height))
}

#[allow(clippy::cast_possible_truncation)]
fn f32_of(v: f64) -> f32 {
    v as f32
}

fn color(c: Rgba, alpha: f64) -> Color {
    let mut color = Color::from_rgba8(c.r, c.g, c.b, c.a);
    color.apply_opacity(f32_of(alpha.clamp(0.0, 1.0)));
    color
}

fn paint(c: Rgba, alpha: f64, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color(c, alpha));
    paint.anti_alias = anti_alias;
    paint
}

fn stroke(style: &StrokeStyle) -> Stroke {
    Stroke {
        width: f32_of(style.width),
        line_cap: match style.cap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
        },
        dash: style
            .dash
            .and_then(|[on, off]| StrokeDash::new(vec![f32_of(on), f32_of(off)], 0.0)),
        ..Stroke::default()
    }
}

fn stroke_segments(
    pixmap: &mut Pixmap,
    segments: &[Segment],
    style: &StrokeStyle,
    anti_alias: bool,
) {
    let mut pb = PathBuilder::new();
    for seg in segments {
        pb.move_to(f32_of(seg.from.x), f32_of(seg.from.y));
        pb.line_to(f32_of(seg.to.x), f32_of(seg.to.y));
    }
    let Some(path) = pb.finish() else {
        return;
    };
    pixmap.stroke_path(
        &path,
        &paint(style.color, style.alpha, anti_alias),
        &stroke(style),
        Transform::identity(),
        None,
    );
}

fn draw_marker(pixmap: &mut Pixmap, op: &DrawOp, anti_alias: bool) {
    let DrawOp::Marker {
        center,
        radius,
        fill,
        outline,
        alpha,
    } = op
    else {
        return;
    };
    let Point { x, y } = *center;
    let Some(circle) = PathBuilder::from_circle(f32_of(x), f32_of(y), f32_of(*radius)) else {
        return;
    };
    pixmap.fill_path(
        &circle,
        &paint(*fill, *alpha, anti_alias),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
    if let Some(ring) = outline {
        let stroke = Stroke {
            width: f32_of(ring.width),
            ..Stroke::default()
        };
        pixmap.stroke_path(
            &circle,
            &paint(ring.color, *alpha, anti_alias),
            &stroke,
            Transform::identity(),
            None,
        );
    }
}

/// Paint every op of `frame` onto `pixmap` in order.
///
/// Image ops are skipped when no reference image is supplied.
pub fn paint_frame(
    pixmap: &mut Pixmap,
    frame: &Frame,
    image: Option<&ReferenceImage>,
    anti_alias: bool,
) {
    for op in &frame.ops {
        match op {
            DrawOp::Clear(c) => pixmap.fill(color(*c, 1.0)),
            DrawOp::FillRect { rect, color: c } => {
                if let Some(r) = tiny_skia::Rect::from_xywh(
                    f32_of(rect.x),
                    f32_of(rect.y),
                    f32_of(rect.width),
                    f32_of(rect.height),
                ) {
                    pixmap.fill_rect(r, &paint(*c, 1.0, anti_alias), Transform::identity(), None);
                }
            }
            DrawOp::Image { rect, alpha } => {
                let Some(image) = image else {
                    tracing::trace!("No reference image, skipping image op");
                    continue;
                };
                let (w, h) = image.pixel_size();
                let transform = Transform::from_row(
                    f32_of(rect.width / f64::from(w)),
                    0.0,
                    0.0,
                    f32_of(rect.height / f64::from(h)),
                    f32_of(rect.x),
                    f32_of(rect.y),
                );
                let paint = PixmapPaint {
                    opacity: f32_of(alpha.clamp(0.0, 1.0)),
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                pixmap.draw_pixmap(0, 0, image.pixmap().as_ref(), &paint, transform, None);
            }
            DrawOp::Lines { segments, stroke } => {
                stroke_segments(pixmap, segments, stroke, anti_alias);
            }
            DrawOp::Marker { .. } => draw_marker(pixmap, op, anti_alias),
        }
    }
}

/// CPU backend painting into an owned pixmap.
pub struct SkiaBackend {
    pixmap: Pixmap,
    anti_alias: bool,
}

impl SkiaBackend {
    /// Create a backend with a surface of the given size.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be allocated.
    pub fn new(width: u32, height: u32, anti_alias: bool) -> RenderResult<Self> {
        Ok(Self {
            pixmap: new_pixmap(width, height)?,
            anti_alias,
        })
    }

    /// The painted surface.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

impl RenderBackend for SkiaBackend {
    fn name(&self) -> &'static str {
        "tiny-skia"
    }

    fn render(&mut self, frame: &Frame, image: Option<&ReferenceImage>) -> RenderResult<()> {
        tracing::trace!(
            "Skia render: {} ops, surface {}x{}",
            frame.ops.len(),
            self.pixmap.width(),
            self.pixmap.height()
        );
        paint_frame(&mut self.pixmap, frame, image, self.anti_alias);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.pixmap = new_pixmap(width, height)?;
        tracing::debug!("Skia surface resized to {}x{}", width, height);
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn encode_png(&self) -> RenderResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perspective_core::render::{Outline, Rect};
    use perspective_core::SurfaceSize;

    fn frame(ops: Vec<DrawOp>) -> Frame {
        Frame {
            size: SurfaceSize::new(20.0, 20.0),
            ops,
        }
    }

    fn solid(color: Rgba, width: f64) -> StrokeStyle {
        StrokeStyle {
            color,
            width,
            alpha: 1.0,
            cap: LineCap::Butt,
            dash: None,
        }
    }

    #[test]
    fn test_clear_fills_surface() {
        let mut backend = SkiaBackend::new(4, 4, true).expect("backend");
        backend
            .render(&frame(vec![DrawOp::Clear(Rgba::WORKSPACE)]), None)
            .expect("render");
        let px = backend.pixmap().pixel(2, 2).expect("pixel");
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (0x02, 0x06, 0x17, 0xff));
    }

    #[test]
    fn test_line_is_stroked() {
        let mut pixmap = new_pixmap(20, 20).expect("pixmap");
        let seg = Segment::new(Point::new(0.0, 10.5), Point::new(20.0, 10.5));
        paint_frame(
            &mut pixmap,
            &frame(vec![DrawOp::Lines {
                segments: vec![seg],
                stroke: solid(Rgba::WHITE, 1.0),
            }]),
            None,
            false,
        );
        assert_eq!(pixmap.pixel(5, 10).map(|p| p.alpha()), Some(255));
        assert_eq!(pixmap.pixel(5, 2).map(|p| p.alpha()), Some(0));
    }

    #[test]
    fn test_marker_fill_and_outline() {
        let mut pixmap = new_pixmap(20, 20).expect("pixmap");
        paint_frame(
            &mut pixmap,
            &frame(vec![DrawOp::Marker {
                center: Point::new(10.0, 10.0),
                radius: 6.0,
                fill: Rgba::rgb(255, 0, 0),
                outline: Some(Outline {
                    color: Rgba::WHITE,
                    width: 2.0,
                }),
                alpha: 1.0,
            }]),
            None,
            false,
        );
        let centre = pixmap.pixel(10, 10).expect("pixel");
        assert_eq!((centre.red(), centre.green()), (255, 0));
        let ring = pixmap.pixel(16, 10).expect("pixel");
        assert_eq!((ring.red(), ring.green(), ring.blue()), (255, 255, 255));
    }

    #[test]
    fn test_fill_rect_and_missing_image() {
        let mut pixmap = new_pixmap(20, 20).expect("pixmap");
        let rect = Rect {
            x: 5.0,
            y: 5.0,
            width: 10.0,
            height: 10.0,
        };
        paint_frame(
            &mut pixmap,
            &frame(vec![
                DrawOp::FillRect {
                    rect,
                    color: Rgba::IMAGE_BACKDROP,
                },
                DrawOp::Image { rect, alpha: 0.4 },
            ]),
            None,
            true,
        );
        assert_eq!(pixmap.pixel(10, 10).map(|p| p.alpha()), Some(255));
        assert_eq!(pixmap.pixel(1, 1).map(|p| p.alpha()), Some(0));
    }

    #[test]
    fn test_zero_size_surface_is_one_pixel() {
        let backend = SkiaBackend::new(0, 0, true).expect("backend");
        assert_eq!(backend.size(), (1, 1));
    }

    #[test]
    fn test_encode_png_magic() {
        let backend = SkiaBackend::new(3, 3, true).expect("backend");
        let png = backend.encode_png().expect("png");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }
}
