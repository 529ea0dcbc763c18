//! Backend-agnostic draw lists.
//!
//! A [`Frame`] is an ordered list of [`DrawOp`]s for one surface. The
//! interactive workspace and the exporter both build frames here from the
//! same geometry rules; a rasteriser only has to paint the ops in order.

use crate::color::Rgba;
use crate::config::{AlphaConfig, EngineConfig};
use crate::geometry::{layer_geometry, ray_count, ImageSize, Placement, Point, Segment, SurfaceSize};
use crate::gesture::GuideLine;
use crate::layer::{Layer, LayerId, LayerKind};
use crate::view::ViewTransform;

/// Dash pattern for guide lines: 10 px on, 5 px off.
pub const GUIDE_DASH: [f64; 2] = [10.0, 5.0];

/// Stroke width of guide lines.
pub const GUIDE_WIDTH: f64 = 2.0;

/// An axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl From<&Placement> for Rect {
    fn from(p: &Placement) -> Self {
        Self {
            x: p.x,
            y: p.y,
            width: p.width,
            height: p.height,
        }
    }
}

/// How stroke ends are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    /// Flat end at the endpoint.
    #[default]
    Butt,
    /// Semicircular end.
    Round,
}

/// Stroke parameters for a [`DrawOp::Lines`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// Stroke colour.
    pub color: Rgba,
    /// Line width in surface pixels.
    pub width: f64,
    /// Opacity multiplier in `[0, 1]`.
    pub alpha: f64,
    /// End caps.
    pub cap: LineCap,
    /// On/off dash lengths, solid when `None`.
    pub dash: Option<[f64; 2]>,
}

/// Ring drawn around a marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outline {
    /// Ring colour.
    pub color: Rgba,
    /// Ring width in surface pixels.
    pub width: f64,
}

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Replace every pixel with a colour.
    Clear(Rgba),
    /// Fill a rectangle.
    FillRect {
        /// Area to fill.
        rect: Rect,
        /// Fill colour.
        color: Rgba,
    },
    /// Draw the reference image scaled into a rectangle.
    Image {
        /// Destination rectangle.
        rect: Rect,
        /// Opacity in `[0, 1]`.
        alpha: f64,
    },
    /// Stroke a set of segments as one path.
    Lines {
        /// Segments in surface pixels.
        segments: Vec<Segment>,
        /// Stroke parameters.
        stroke: StrokeStyle,
    },
    /// A filled circle marking a vanishing point.
    Marker {
        /// Centre in surface pixels.
        center: Point,
        /// Radius in surface pixels.
        radius: f64,
        /// Fill colour.
        fill: Rgba,
        /// Optional ring.
        outline: Option<Outline>,
        /// Opacity in `[0, 1]`.
        alpha: f64,
    },
}

/// A complete draw list for one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Surface size in pixels.
    pub size: SurfaceSize,
    /// Ops in paint order.
    pub ops: Vec<DrawOp>,
}

impl Frame {
    /// An empty frame.
    #[must_use]
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            ops: Vec::new(),
        }
    }

    /// Number of line segments across all ops.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                DrawOp::Lines { segments, .. } => segments.len(),
                _ => 0,
            })
            .sum()
    }

    /// Centres of every marker, in paint order.
    #[must_use]
    pub fn marker_centers(&self) -> Vec<Point> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Marker { center, .. } => Some(*center),
                _ => None,
            })
            .collect()
    }
}

/// How markers are drawn for a layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum MarkerRule {
    /// No markers.
    Hidden,
    /// Always drawn, with fixed radius and an outline.
    Interactive {
        radius: f64,
        alpha: f64,
        outline: Outline,
    },
    /// Drawn only when inside the surface, sized from the stroke width.
    Export,
}

/// Per-layer styling chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LayerStyle {
    pub stroke: StrokeStyle,
    pub markers: MarkerRule,
}

/// Append the ops that draw `layer` to `ops`.
///
/// Each vanishing point's fan is one path followed by its marker. Grid lines
/// are stroked one at a time.
pub(crate) fn push_layer_ops(
    ops: &mut Vec<DrawOp>,
    layer: &Layer,
    placement: &Placement,
    surface: SurfaceSize,
    reach_factor: f64,
    style: &LayerStyle,
) {
    let geometry = layer_geometry(layer, placement, surface, reach_factor);
    if geometry.is_empty() {
        return;
    }
    let color = style.stroke.color;

    match &layer.kind {
        LayerKind::Radial { density, .. } => {
            let per_point = ray_count(*density) as usize;
            for (fan, anchor) in geometry.segments.chunks(per_point).zip(&geometry.anchors) {
                ops.push(DrawOp::Lines {
                    segments: fan.to_vec(),
                    stroke: style.stroke,
                });
                match style.markers {
                    MarkerRule::Hidden => {}
                    MarkerRule::Interactive { radius, alpha, outline } => ops.push(DrawOp::Marker {
                        center: *anchor,
                        radius,
                        fill: color,
                        outline: Some(outline),
                        alpha,
                    }),
                    MarkerRule::Export => {
                        if surface.contains(*anchor) {
                            ops.push(DrawOp::Marker {
                                center: *anchor,
                                radius: layer.width * 3.0 + 2.0,
                                fill: color,
                                outline: None,
                                alpha: style.stroke.alpha,
                            });
                        }
                    }
                }
            }
        }
        LayerKind::Grid { .. } => {
            ops.extend(geometry.segments.into_iter().map(|segment| DrawOp::Lines {
                segments: vec![segment],
                stroke: style.stroke,
            }));
        }
    }
}

/// Everything needed to draw the interactive workspace.
#[derive(Debug, Clone, Copy)]
pub struct WorkspaceScene<'a> {
    /// Layers in draw order.
    pub layers: &'a [Layer],
    /// Active layer, drawn emphasised.
    pub active: Option<&'a LayerId>,
    /// Hovered layer, drawn half-emphasised.
    pub hovered: Option<&'a LayerId>,
    /// Current pan/zoom.
    pub view: &'a ViewTransform,
    /// Reference image size; nothing but the background is drawn without one.
    pub image: Option<ImageSize>,
    /// Whether guide mode is on.
    pub guide_mode: bool,
    /// Committed guides plus any in-flight capture.
    pub guides: &'a [GuideLine],
    /// Tunables.
    pub config: &'a EngineConfig,
}

impl WorkspaceScene<'_> {
    fn layer_alpha(&self, alpha: &AlphaConfig, is_active: bool, is_hovered: bool) -> f64 {
        let base = if is_active {
            alpha.active
        } else if is_hovered {
            alpha.hovered
        } else {
            alpha.idle
        };
        if self.guide_mode {
            base * alpha.guide_dampening
        } else {
            base
        }
    }

    /// Build the frame for the current state.
    #[must_use]
    pub fn build(&self) -> Frame {
        let mut frame = Frame::new(self.view.viewport);
        frame.ops.push(DrawOp::Clear(Rgba::WORKSPACE));

        let Some(image) = self.image else {
            return frame;
        };
        let placement = self.view.placement(image);
        let alpha = &self.config.alpha;

        frame.ops.push(DrawOp::FillRect {
            rect: Rect::from(&placement),
            color: Rgba::IMAGE_BACKDROP,
        });
        frame.ops.push(DrawOp::Image {
            rect: Rect::from(&placement),
            alpha: if self.guide_mode { alpha.guide_image } else { alpha.image },
        });

        for layer in self.layers.iter().filter(|l| l.visible) {
            let is_active = self.active == Some(&layer.id);
            let is_hovered = self.hovered == Some(&layer.id);
            let markers = if self.guide_mode {
                MarkerRule::Hidden
            } else {
                MarkerRule::Interactive {
                    radius: if is_active { 8.0 } else { 5.0 },
                    alpha: if is_active { 1.0 } else { 0.7 },
                    outline: Outline {
                        color: if layer.locked { Rgba::AMBER } else { Rgba::WHITE },
                        width: 2.0,
                    },
                }
            };
            let style = LayerStyle {
                stroke: StrokeStyle {
                    color: Rgba::from_layer_color(&layer.color),
                    width: if is_active || is_hovered {
                        layer.width + 1.0
                    } else {
                        layer.width
                    },
                    alpha: self.layer_alpha(alpha, is_active, is_hovered),
                    cap: LineCap::Butt,
                    dash: None,
                },
                markers,
            };
            push_layer_ops(
                &mut frame.ops,
                layer,
                &placement,
                self.view.viewport,
                self.config.ray_reach_factor,
                &style,
            );
        }

        if self.guide_mode && !self.guides.is_empty() {
            frame.ops.push(DrawOp::Lines {
                segments: self.guides.iter().map(|g| Segment::new(g.start, g.end)).collect(),
                stroke: StrokeStyle {
                    color: Rgba::AMBER,
                    width: GUIDE_WIDTH,
                    alpha: 1.0,
                    cap: LineCap::Butt,
                    dash: Some(GUIDE_DASH),
                },
            });
        }

        tracing::trace!("Built workspace frame with {} ops", frame.ops.len());
        frame
    }
}
