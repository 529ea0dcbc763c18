//! Pan/zoom view transform and coordinate conversions.
//!
//! The view is interactive-only state. It decides where the image sits on the
//! screen; it is never persisted and never consulted by export.

use crate::geometry::{ImageSize, Placement, Point, SurfaceSize};

/// Pan/zoom state for the workspace.
///
/// `pan` is in screen pixels. `zoom` is screen pixels per image pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Screen pixels per image pixel.
    pub zoom: f64,
    /// Offset of the image centre from the viewport centre, in screen pixels.
    pub pan: Point,
    /// Viewport size in screen pixels.
    pub viewport: SurfaceSize,
}

impl ViewTransform {
    /// Create a view with the given zoom, no pan and the given viewport.
    #[must_use]
    pub fn new(zoom: f64, viewport: SurfaceSize) -> Self {
        Self {
            zoom,
            pan: Point::ORIGIN,
            viewport,
        }
    }

    /// Screen position of the image centre.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            self.viewport.width / 2.0 + self.pan.x,
            self.viewport.height / 2.0 + self.pan.y,
        )
    }

    /// Where the image sits on screen at the current pan/zoom.
    #[must_use]
    pub fn placement(&self, image: ImageSize) -> Placement {
        let c = self.center();
        let width = f64::from(image.width) * self.zoom;
        let height = f64::from(image.height) * self.zoom;
        Placement {
            x: c.x - width / 2.0,
            y: c.y - height / 2.0,
            width,
            height,
            scale: self.zoom,
        }
    }

    /// Convert an image-centred point to screen pixels.
    #[must_use]
    pub fn image_to_screen(&self, p: Point) -> Point {
        let c = self.center();
        Point::new(c.x + p.x * self.zoom, c.y + p.y * self.zoom)
    }

    /// Convert a screen position to image-centred coordinates.
    #[must_use]
    pub fn screen_to_image(&self, s: Point) -> Point {
        let c = self.center();
        Point::new((s.x - c.x) / self.zoom, (s.y - c.y) / self.zoom)
    }

    /// Convert a screen-space distance to image units.
    #[must_use]
    pub fn screen_dist_to_image(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan.x += dx;
        self.pan.y += dy;
    }

    /// Scale zoom multiplicatively from a wheel delta and clamp it.
    ///
    /// Positive `delta_y` (scrolling down) zooms out. The view stays anchored
    /// on its current centre, not on the pointer.
    pub fn zoom_by_wheel(&mut self, delta_y: f64, sensitivity: f64, min: f64, max: f64) {
        let zoom = self.zoom * (-delta_y * sensitivity).exp();
        if !zoom.is_nan() {
            self.zoom = zoom.clamp(min, max);
        }
    }

    /// Restore zoom and clear the pan in one step.
    pub fn reset(&mut self, zoom: f64) {
        self.zoom = zoom;
        self.pan = Point::ORIGIN;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    fn view(zoom: f64, pan: Point) -> ViewTransform {
        let mut v = ViewTransform::new(zoom, SurfaceSize::new(800.0, 600.0));
        v.pan = pan;
        v
    }

    #[test]
    fn test_round_trip_over_zoom_range() {
        let screen_pts = [
            Point::new(0.0, 0.0),
            Point::new(400.0, 300.0),
            Point::new(-120.5, 999.25),
            Point::new(12_345.0, -7.0),
        ];
        for zoom in [0.05, 0.1, 0.6, 1.0, 2.5, 5.0, 8.0] {
            for pan in [Point::ORIGIN, Point::new(-333.0, 41.5), Point::new(1e4, -1e4)] {
                let v = view(zoom, pan);
                for s in screen_pts {
                    let back = v.image_to_screen(v.screen_to_image(s));
                    assert!(approx(back, s), "zoom {zoom} pan {pan:?}: {s:?} -> {back:?}");
                }
            }
        }
    }

    #[test]
    fn test_image_origin_maps_to_view_center() {
        let v = view(2.0, Point::new(10.0, -20.0));
        assert_eq!(v.image_to_screen(Point::ORIGIN), Point::new(410.0, 280.0));
    }

    #[test]
    fn test_placement_centres_scaled_image() {
        let v = view(0.5, Point::ORIGIN);
        let p = v.placement(ImageSize::new(400, 200));
        assert!((p.width - 200.0).abs() < f64::EPSILON);
        assert!((p.height - 100.0).abs() < f64::EPSILON);
        assert!((p.x - 300.0).abs() < f64::EPSILON);
        assert!((p.y - 250.0).abs() < f64::EPSILON);
        assert_eq!(p.center(), v.center());
        assert_eq!(p.project(Point::new(100.0, 0.0)), v.image_to_screen(Point::new(100.0, 0.0)));
    }

    #[test]
    fn test_wheel_zoom_is_multiplicative_and_clamped() {
        let mut v = view(1.0, Point::ORIGIN);
        v.zoom_by_wheel(-100.0, 0.001, 0.05, 8.0);
        let up = v.zoom;
        assert!(up > 1.0);
        v.zoom_by_wheel(100.0, 0.001, 0.05, 8.0);
        assert!((v.zoom - 1.0).abs() < 1e-12);

        v.zoom_by_wheel(1e6, 0.001, 0.05, 8.0);
        assert!((v.zoom - 0.05).abs() < f64::EPSILON);
        v.zoom_by_wheel(-1e6, 0.001, 0.05, 8.0);
        assert!((v.zoom - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_keeps_centre_anchor() {
        let mut v = view(1.0, Point::new(50.0, 25.0));
        let before = v.center();
        v.zoom_by_wheel(-300.0, 0.001, 0.05, 8.0);
        assert_eq!(v.center(), before);
    }

    #[test]
    fn test_reset_restores_default() {
        let mut v = view(3.0, Point::new(5.0, 5.0));
        v.reset(0.6);
        assert!((v.zoom - 0.6).abs() < f64::EPSILON);
        assert_eq!(v.pan, Point::ORIGIN);
    }
}
