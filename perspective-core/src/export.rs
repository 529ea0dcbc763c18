//! Export frames at the reference image's native resolution.
//!
//! Export never consults the view transform: layers are placed 1:1 on a
//! transparent surface the size of the image, at full opacity, without
//! hover or active styling.

use crate::color::Rgba;
use crate::geometry::{ImageSize, Placement, SurfaceSize};
use crate::layer::Layer;
use crate::render::{push_layer_ops, DrawOp, Frame, LayerStyle, LineCap, MarkerRule, StrokeStyle};

/// Ray length multiplier used for export surfaces.
pub const EXPORT_REACH_FACTOR: f64 = 20.0;

/// A frame with the file name it should be saved under.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    /// Suggested file name.
    pub file_name: String,
    /// What to rasterise.
    pub frame: Frame,
}

fn export_style(layer: &Layer) -> LayerStyle {
    LayerStyle {
        stroke: StrokeStyle {
            color: Rgba::from_layer_color(&layer.color),
            width: layer.width,
            alpha: 1.0,
            cap: LineCap::Round,
            dash: None,
        },
        markers: MarkerRule::Export,
    }
}

fn layer_frame<'a>(
    layers: impl IntoIterator<Item = &'a Layer>,
    image: ImageSize,
    reach_factor: f64,
) -> Frame {
    let surface = SurfaceSize::from(image);
    let placement = Placement::native(image);
    let mut frame = Frame::new(surface);
    frame.ops.push(DrawOp::Clear(Rgba::TRANSPARENT));
    for layer in layers {
        push_layer_ops(
            &mut frame.ops,
            layer,
            &placement,
            surface,
            reach_factor,
            &export_style(layer),
        );
    }
    frame
}

/// One frame holding every visible layer in draw order.
#[must_use]
pub fn merged_frame(layers: &[Layer], image: ImageSize, reach_factor: f64) -> Frame {
    layer_frame(layers.iter().filter(|l| l.visible), image, reach_factor)
}

/// The merged export with its file name.
#[must_use]
pub fn merged_plan(
    layers: &[Layer],
    image: ImageSize,
    reach_factor: f64,
    timestamp: u64,
) -> ExportPlan {
    ExportPlan {
        file_name: merged_file_name(timestamp),
        frame: merged_frame(layers, image, reach_factor),
    }
}

/// One plan per visible layer, numbered from 1 in visible order.
#[must_use]
pub fn layer_plans(layers: &[Layer], image: ImageSize, reach_factor: f64) -> Vec<ExportPlan> {
    layers
        .iter()
        .filter(|l| l.visible)
        .enumerate()
        .map(|(i, layer)| ExportPlan {
            file_name: layer_file_name(i + 1, &layer.name),
            frame: layer_frame(std::iter::once(layer), image, reach_factor),
        })
        .collect()
}

/// `perspective_merged_<timestamp>.png`
#[must_use]
pub fn merged_file_name(timestamp: u64) -> String {
    format!("perspective_merged_{timestamp}.png")
}

/// `layer_<index>_<name>.png`, with path separators in `name` replaced.
#[must_use]
pub fn layer_file_name(index: usize, name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("layer_{index}_{safe}.png")
}
