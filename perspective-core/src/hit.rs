//! Hit-testing pointer positions against layer geometry.
//!
//! All comparisons happen in screen pixels after projecting the layer, so the
//! tolerances do not change with zoom.

use crate::config::EngineConfig;
use crate::geometry::{grid_lines, ray_angles, Placement, Point};
use crate::layer::{Layer, LayerId, LayerKind};

/// Which part of a layer was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    /// A vanishing point, by index within the layer.
    VanishingPoint(usize),
    /// The body of a ray in a radial fan.
    Ray,
    /// A vertical or horizontal grid line.
    GridLine,
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    /// The layer that was hit.
    pub layer_id: LayerId,
    /// The part of the layer under the pointer.
    pub part: HitPart,
}

/// Screen-pixel tolerances for hit-testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTolerance {
    /// Radius around a vanishing point.
    pub point_radius: f64,
    /// Perpendicular distance to a ray or grid line.
    pub line: f64,
    /// Distance behind a ray's apex still counted as on the ray.
    pub ray_backtrack: f64,
}

impl Default for HitTolerance {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for HitTolerance {
    fn from(config: &EngineConfig) -> Self {
        Self {
            point_radius: config.point_hit_radius,
            line: config.line_hit_tolerance,
            ray_backtrack: config.ray_backtrack,
        }
    }
}

/// Find the topmost interactive layer under `screen`.
///
/// Layers are tested back to front of the draw order (last drawn first).
/// Hidden and locked layers are skipped. Within a radial layer every
/// vanishing point is tested before any ray.
#[must_use]
pub fn hit_test(
    screen: Point,
    layers: &[Layer],
    placement: &Placement,
    tol: &HitTolerance,
) -> Option<Hit> {
    if !placement.is_drawable() {
        return None;
    }

    layers
        .iter()
        .rev()
        .filter(|layer| layer.is_interactive())
        .find_map(|layer| {
            hit_layer(screen, layer, placement, tol).map(|part| Hit {
                layer_id: layer.id.clone(),
                part,
            })
        })
}

fn hit_layer(
    screen: Point,
    layer: &Layer,
    placement: &Placement,
    tol: &HitTolerance,
) -> Option<HitPart> {
    match &layer.kind {
        LayerKind::Radial { points, density } => {
            hit_radial(screen, points, *density, placement, tol)
        }
        LayerKind::Grid { density, density_y } => {
            hit_grid(screen, *density, *density_y, placement, tol)
        }
    }
}

fn hit_radial(
    screen: Point,
    points: &[Point],
    density: u32,
    placement: &Placement,
    tol: &HitTolerance,
) -> Option<HitPart> {
    let apexes: Vec<Point> = points.iter().map(|p| placement.project(*p)).collect();

    if let Some(index) = apexes
        .iter()
        .position(|apex| screen.distance_to(*apex) < tol.point_radius)
    {
        return Some(HitPart::VanishingPoint(index));
    }

    let on_ray = apexes.iter().any(|apex| {
        let dx = screen.x - apex.x;
        let dy = screen.y - apex.y;
        ray_angles(density).any(|deg| {
            let (sin, cos) = deg.to_radians().sin_cos();
            let perpendicular = (dx * sin - dy * cos).abs();
            let along = dx * cos + dy * sin;
            perpendicular < tol.line && along > -tol.ray_backtrack
        })
    });
    on_ray.then_some(HitPart::Ray)
}

fn hit_grid(
    screen: Point,
    density: u32,
    density_y: u32,
    placement: &Placement,
    tol: &HitTolerance,
) -> Option<HitPart> {
    let (xs, ys) = grid_lines(density, density_y, placement);
    let top = placement.y;
    let bottom = placement.y + placement.height;
    let left = placement.x;
    let right = placement.x + placement.width;

    let on_vertical = screen.y > top
        && screen.y < bottom
        && xs.iter().any(|x| (screen.x - x).abs() < tol.line);
    let on_horizontal = screen.x > left
        && screen.x < right
        && ys.iter().any(|y| (screen.y - y).abs() < tol.line);

    (on_vertical || on_horizontal).then_some(HitPart::GridLine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ImageSize, SurfaceSize};
    use crate::view::ViewTransform;

    fn radial(id: &str, points: Vec<Point>, density: u32) -> Layer {
        let mut layer = Layer::radial(LayerId::from_raw(id), id, "#fff", Point::ORIGIN);
        layer.kind = LayerKind::Radial { points, density };
        layer
    }

    fn grid(id: &str, density: u32, density_y: u32) -> Layer {
        let mut layer = Layer::grid(LayerId::from_raw(id), id, "#fff");
        layer.kind = LayerKind::Grid { density, density_y };
        layer
    }

    fn view(zoom: f64) -> ViewTransform {
        ViewTransform::new(zoom, SurfaceSize::new(1000.0, 800.0))
    }

    const IMAGE: ImageSize = ImageSize::new(400, 300);

    #[test]
    fn test_point_hit_is_zoom_invariant() {
        let layers = vec![radial("a", vec![Point::new(50.0, 50.0)], 12)];
        let tol = HitTolerance::default();
        for zoom in [0.1, 1.0, 5.0] {
            let v = view(zoom);
            let screen = v.image_to_screen(Point::new(50.0, 50.0));
            let nudged = Point::new(screen.x + 10.0, screen.y - 5.0);
            let hit = hit_test(nudged, &layers, &v.placement(IMAGE), &tol).expect("hit");
            assert_eq!(hit.part, HitPart::VanishingPoint(0), "zoom {zoom}");

            let far = Point::new(screen.x + 14.0, screen.y + 14.0);
            let miss = hit_test(far, &layers, &v.placement(IMAGE), &tol);
            assert_ne!(miss.map(|h| h.part), Some(HitPart::VanishingPoint(0)), "zoom {zoom}");
        }
    }

    #[test]
    fn test_topmost_layer_wins() {
        let layers = vec![
            radial("bottom", vec![Point::ORIGIN], 12),
            radial("top", vec![Point::ORIGIN], 12),
        ];
        let v = view(1.0);
        let hit = hit_test(v.center(), &layers, &v.placement(IMAGE), &HitTolerance::default())
            .expect("hit");
        assert_eq!(hit.layer_id.as_str(), "top");
    }

    #[test]
    fn test_hidden_and_locked_layers_are_skipped() {
        let mut top = radial("top", vec![Point::ORIGIN], 12);
        top.locked = true;
        let mut middle = radial("middle", vec![Point::ORIGIN], 12);
        middle.visible = false;
        let layers = vec![radial("bottom", vec![Point::ORIGIN], 12), middle, top];
        let v = view(1.0);
        let hit = hit_test(v.center(), &layers, &v.placement(IMAGE), &HitTolerance::default())
            .expect("hit");
        assert_eq!(hit.layer_id.as_str(), "bottom");
    }

    #[test]
    fn test_earlier_point_wins_and_points_beat_rays() {
        // Second point sits on the 0-degree ray of the first point.
        let points = vec![
            Point::new(-100.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(102.0, 0.0),
        ];
        let layers = vec![radial("a", points, 1)];
        let v = view(1.0);
        let screen = v.image_to_screen(Point::new(101.0, 0.0));
        let hit =
            hit_test(screen, &layers, &v.placement(IMAGE), &HitTolerance::default()).expect("hit");
        assert_eq!(hit.part, HitPart::VanishingPoint(1));
    }

    #[test]
    fn test_ray_body_hit_and_backtrack() {
        let layers = vec![radial("a", vec![Point::ORIGIN], 1)];
        let v = view(1.0);
        let placement = v.placement(IMAGE);
        let tol = HitTolerance::default();
        let c = v.center();

        let on_ray = Point::new(c.x + 200.0, c.y + 3.0);
        assert_eq!(hit_test(on_ray, &layers, &placement, &tol).map(|h| h.part), Some(HitPart::Ray));

        // Diagonal between rays at density 1 (rays at 0/90/180/270).
        let between = Point::new(c.x + 100.0, c.y + 100.0);
        assert!(hit_test(between, &layers, &placement, &tol).is_none());
    }

    #[test]
    fn test_grid_line_hits_within_extent() {
        let layers = vec![grid("g", 4, 3)];
        let v = view(1.0);
        let placement = v.placement(IMAGE);
        let tol = HitTolerance::default();
        // Image spans x 300..700, y 250..550; verticals every 100, horizontals every 100.
        let near_vertical = Point::new(404.0, 320.0);
        assert_eq!(
            hit_test(near_vertical, &layers, &placement, &tol).map(|h| h.part),
            Some(HitPart::GridLine)
        );

        let near_horizontal = Point::new(333.0, 452.0);
        assert!(hit_test(near_horizontal, &layers, &placement, &tol).is_some());

        let inside_cell = Point::new(350.0, 300.0);
        assert!(hit_test(inside_cell, &layers, &placement, &tol).is_none());

        // On the extension of a vertical line but outside the image.
        let beyond = Point::new(400.0, 600.0);
        assert!(hit_test(beyond, &layers, &placement, &tol).is_none());
    }

    #[test]
    fn test_no_layers_no_hit() {
        let v = view(1.0);
        assert!(hit_test(v.center(), &[], &v.placement(IMAGE), &HitTolerance::default()).is_none());
    }
}
