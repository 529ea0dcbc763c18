//! Geometric rules shared by the interactive and export render paths.
//!
//! Everything here is a pure function of a [`Layer`], a [`Placement`] and the
//! surface size. The same rule draws the on-screen overlay at any zoom and the
//! full-resolution export, so the two only differ by placement and scale.

use serde::{Deserialize, Serialize};

use crate::layer::{Layer, LayerKind, MAX_DENSITY};

/// A 2D position.
///
/// Layer points are image-centred (origin at the image centre); screen and
/// export positions are surface pixels. The type is shared, the space is
/// always named at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal offset.
    pub x: f64,
    /// Vertical offset (positive = down).
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Native pixel size of the reference image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageSize {
    /// Create an image size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Where the image sits on a target surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge of the image rectangle in surface pixels.
    pub x: f64,
    /// Top edge of the image rectangle in surface pixels.
    pub y: f64,
    /// Width of the image rectangle in surface pixels.
    pub width: f64,
    /// Height of the image rectangle in surface pixels.
    pub height: f64,
    /// Surface pixels per image pixel.
    pub scale: f64,
}

impl Placement {
    /// The 1:1 placement used for export: full native size at the origin.
    #[must_use]
    pub fn native(image: ImageSize) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: f64::from(image.width),
            height: f64::from(image.height),
            scale: 1.0,
        }
    }

    /// Centre of the image rectangle; image-centred `(0, 0)` maps here.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Map an image-centred point onto the surface.
    #[must_use]
    pub fn project(&self, p: Point) -> Point {
        let c = self.center();
        Point::new(c.x + p.x * self.scale, c.y + p.y * self.scale)
    }

    /// Whether the placement can be drawn at all.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.scale > 0.0
            && self.width.is_finite()
            && self.height.is_finite()
            && self.scale.is_finite()
    }
}

/// Pixel size of the surface being drawn on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl SurfaceSize {
    /// Create a surface size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether `p` lies inside the surface, edges included.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }
}

impl From<ImageSize> for SurfaceSize {
    fn from(size: ImageSize) -> Self {
        Self::new(f64::from(size.width), f64::from(size.height))
    }
}

/// A straight stroke between two surface points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start point.
    pub from: Point,
    /// End point.
    pub to: Point,
}

impl Segment {
    /// Create a segment.
    #[must_use]
    pub const fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    /// Direction angle in degrees, normalised to `[0, 360)`.
    #[must_use]
    pub fn angle_degrees(&self) -> f64 {
        let deg = (self.to.y - self.from.y)
            .atan2(self.to.x - self.from.x)
            .to_degrees();
        if deg < 0.0 {
            deg + 360.0
        } else {
            deg
        }
    }
}

/// The strokes and vanishing-point anchors a layer produces on a surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerGeometry {
    /// Line segments in draw order.
    pub segments: Vec<Segment>,
    /// Surface positions of the layer's vanishing points (radial only).
    pub anchors: Vec<Point>,
}

impl LayerGeometry {
    /// Whether nothing would be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.anchors.is_empty()
    }
}

/// Number of rays in a radial fan of the given density.
///
/// Densities above [`MAX_DENSITY`] draw as [`MAX_DENSITY`].
#[must_use]
pub const fn ray_count(density: u32) -> u32 {
    clamp_density(density) * 4
}

const fn clamp_density(density: u32) -> u32 {
    if density > MAX_DENSITY {
        MAX_DENSITY
    } else {
        density
    }
}

/// Ray directions in degrees: evenly spaced, first ray at 0°.
pub fn ray_angles(density: u32) -> impl Iterator<Item = f64> {
    let total = ray_count(density);
    let step = if total == 0 {
        0.0
    } else {
        360.0 / f64::from(total)
    };
    (0..total).map(move |i| f64::from(i) * step)
}

/// Produce the geometry of `layer` on a surface.
///
/// Rays extend `max(surface.width, surface.height) * reach_factor` from their
/// apex so they leave the surface wherever the vanishing point sits. A zero
/// density or an undrawable placement yields empty geometry.
#[must_use]
pub fn layer_geometry(
    layer: &Layer,
    placement: &Placement,
    surface: SurfaceSize,
    reach_factor: f64,
) -> LayerGeometry {
    if !placement.is_drawable() {
        return LayerGeometry::default();
    }

    match &layer.kind {
        LayerKind::Radial { points, density } => {
            let reach = surface.width.max(surface.height) * reach_factor;
            radial_geometry(points, *density, placement, reach)
        }
        LayerKind::Grid { density, density_y } => grid_geometry(*density, *density_y, placement),
    }
}

fn radial_geometry(
    points: &[Point],
    density: u32,
    placement: &Placement,
    reach: f64,
) -> LayerGeometry {
    if density == 0 {
        return LayerGeometry::default();
    }

    let mut geometry = LayerGeometry {
        segments: Vec::with_capacity(points.len().saturating_mul(ray_count(density) as usize)),
        anchors: Vec::with_capacity(points.len()),
    };

    for vp in points {
        let apex = placement.project(*vp);
        geometry.anchors.push(apex);
        for deg in ray_angles(density) {
            let rad = deg.to_radians();
            let end = Point::new(apex.x + rad.cos() * reach, apex.y + rad.sin() * reach);
            geometry.segments.push(Segment::new(apex, end));
        }
    }
    geometry
}

fn grid_geometry(density: u32, density_y: u32, placement: &Placement) -> LayerGeometry {
    if density == 0 || density_y == 0 {
        return LayerGeometry::default();
    }

    let (density, density_y) = (clamp_density(density), clamp_density(density_y));
    let Placement {
        x, y, width, height, ..
    } = *placement;
    let dx = width / f64::from(density);
    let dy = height / f64::from(density_y);

    let mut segments = Vec::with_capacity((density + density_y + 2) as usize);
    for i in 0..=density {
        let lx = x + f64::from(i) * dx;
        segments.push(Segment::new(Point::new(lx, y), Point::new(lx, y + height)));
    }
    for j in 0..=density_y {
        let ly = y + f64::from(j) * dy;
        segments.push(Segment::new(Point::new(x, ly), Point::new(x + width, ly)));
    }

    LayerGeometry {
        segments,
        anchors: Vec::new(),
    }
}

/// Grid line positions along each axis, as drawn by [`layer_geometry`].
///
/// Returns `(vertical x positions, horizontal y positions)`; empty when either
/// density is zero.
#[must_use]
pub fn grid_lines(density: u32, density_y: u32, placement: &Placement) -> (Vec<f64>, Vec<f64>) {
    if density == 0 || density_y == 0 || !placement.is_drawable() {
        return (Vec::new(), Vec::new());
    }
    let (density, density_y) = (clamp_density(density), clamp_density(density_y));
    let dx = placement.width / f64::from(density);
    let dy = placement.height / f64::from(density_y);
    let xs = (0..=density).map(|i| placement.x + f64::from(i) * dx).collect();
    let ys = (0..=density_y).map(|j| placement.y + f64::from(j) * dy).collect();
    (xs, ys)
}
