//! Overlay layers - the building blocks of a perspective guide.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Point;

/// Colours assigned to new layers, cycled by collection length.
pub const PRESET_COLORS: [&str; 6] = [
    "#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899",
];

/// Ray-quadruplet count for a new radial layer.
pub const DEFAULT_RADIAL_DENSITY: u32 = 12;

/// Vertical and horizontal band count for a new grid layer.
pub const DEFAULT_GRID_DENSITY: u32 = 10;

/// Stroke width for new layers, in image pixels.
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;

/// Largest density a stored layer may carry, for either axis.
pub const MAX_DENSITY: u32 = 1024;

/// Unique identifier for a layer.
///
/// Generated ids are UUID v7, so they sort by creation time and are never
/// reused. Ids read from a project file are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Create a new time-ordered layer ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("vp-{}", Uuid::now_v7().simple()))
    }

    /// Wrap an existing identifier.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The geometry a layer draws.
///
/// Serialised with the `type` tag the project format uses
/// (`"perspective"` / `"ortho-grid"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayerKind {
    /// A fan of rays around one or more vanishing points.
    #[serde(rename = "perspective")]
    Radial {
        /// Vanishing points in image-centred coordinates. Never empty.
        points: Vec<Point>,
        /// Ray-quadruplet count; `density * 4` rays per point.
        density: u32,
    },

    /// An orthogonal grid over the image rectangle.
    #[serde(rename = "ortho-grid")]
    Grid {
        /// Number of vertical bands.
        density: u32,
        /// Number of horizontal bands.
        #[serde(rename = "densityY", default = "default_density_y")]
        density_y: u32,
    },
}

fn default_density_y() -> u32 {
    1
}

impl LayerKind {
    /// Whether this is a radial fan.
    #[must_use]
    pub fn is_radial(&self) -> bool {
        matches!(self, Self::Radial { .. })
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Radial { .. } => "radial",
            Self::Grid { .. } => "grid",
        }
    }
}

/// A single overlay layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Unique identifier, stable for the layer's lifetime.
    pub id: LayerId,
    /// Display name.
    pub name: String,
    /// Variant-specific geometry.
    #[serde(flatten)]
    pub kind: LayerKind,
    /// Hidden layers neither render nor export.
    pub visible: bool,
    /// Locked layers ignore pointer interaction but still render and export.
    pub locked: bool,
    /// Stroke colour as a hex string.
    pub color: String,
    /// Stroke width in image pixels.
    pub width: f64,
}

impl Layer {
    /// Create a visible, unlocked radial layer with a single vanishing point.
    #[must_use]
    pub fn radial(
        id: LayerId,
        name: impl Into<String>,
        color: impl Into<String>,
        point: Point,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind: LayerKind::Radial {
                points: vec![point],
                density: DEFAULT_RADIAL_DENSITY,
            },
            visible: true,
            locked: false,
            color: color.into(),
            width: DEFAULT_STROKE_WIDTH,
        }
    }

    /// Create a visible, unlocked grid layer.
    #[must_use]
    pub fn grid(id: LayerId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: LayerKind::Grid {
                density: DEFAULT_GRID_DENSITY,
                density_y: DEFAULT_GRID_DENSITY,
            },
            visible: true,
            locked: false,
            color: color.into(),
            width: DEFAULT_STROKE_WIDTH,
        }
    }

    /// Vanishing points of a radial layer; empty for grids.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        match &self.kind {
            LayerKind::Radial { points, .. } => points,
            LayerKind::Grid { .. } => &[],
        }
    }

    /// Whether pointer gestures may act on this layer.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.visible && !self.locked
    }

    /// Check the invariants a stored layer must satisfy.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        let densest = match &self.kind {
            LayerKind::Radial { points, density } => {
                if points.is_empty() {
                    return Err(format!("radial layer {} has no vanishing points", self.id));
                }
                *density
            }
            LayerKind::Grid { density, density_y } => (*density).max(*density_y),
        };
        if densest > MAX_DENSITY {
            return Err(format!("layer {} density {densest} exceeds {MAX_DENSITY}", self.id));
        }
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(format!("layer {} has non-positive width {}", self.id, self.width));
        }
        Ok(())
    }

    /// Apply a sparse property edit.
    ///
    /// `density_y` is ignored for radial layers. Densities are clamped to
    /// [`MAX_DENSITY`].
    pub fn apply(&mut self, patch: &LayerPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(color) = &patch.color {
            self.color.clone_from(color);
        }
        if let Some(width) = patch.width {
            if width.is_finite() && width > 0.0 {
                self.width = width;
            } else {
                tracing::warn!("Ignoring invalid stroke width {width} for layer {}", self.id);
            }
        }
        match &mut self.kind {
            LayerKind::Radial { density, .. } => {
                if let Some(d) = patch.density {
                    *density = d.min(MAX_DENSITY);
                }
            }
            LayerKind::Grid { density, density_y } => {
                if let Some(d) = patch.density {
                    *density = d.min(MAX_DENSITY);
                }
                if let Some(d) = patch.density_y {
                    *density_y = d.min(MAX_DENSITY);
                }
            }
        }
    }
}

/// Sparse update for a layer's properties. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerPatch {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New stroke colour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// New stroke width; non-positive values are rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// New density (rays/4 for radial, vertical bands for grid).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<u32>,
    /// New horizontal band count (grid only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density_y: Option<u32>,
}
