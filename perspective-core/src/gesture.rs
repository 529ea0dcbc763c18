//! Gesture state machine types and the cursor hint derived from them.

use crate::geometry::Point;
use crate::layer::LayerId;

/// A captured guide line in screen coordinates.
///
/// Guides are drawn only; nothing is estimated from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    /// Where the press happened.
    pub start: Point,
    /// Latest (or release) pointer position.
    pub end: Point,
}

impl GuideLine {
    /// A zero-length guide at `p`.
    #[must_use]
    pub const fn at(p: Point) -> Self {
        Self { start: p, end: p }
    }
}

/// The gesture tracked between pointer-down and pointer-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Alt-drag pan of the view.
    Panning {
        /// Screen position of the previous event.
        last: Point,
    },
    /// Moving a radial layer's vanishing points.
    Dragging {
        /// Layer being dragged.
        layer_id: LayerId,
        /// Screen position of the press.
        start: Point,
        /// The layer's first vanishing point when the drag began.
        origin: Point,
    },
    /// Recording a guide line while guide mode is on.
    CapturingGuide(GuideLine),
}

impl Gesture {
    /// Whether no gesture is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Panning { .. } => "panning",
            Self::Dragging { .. } => "dragging",
            Self::CapturingGuide(_) => "capturing-guide",
        }
    }
}

/// Cursor the host should show over the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Plain arrow.
    #[default]
    Default,
    /// Hovering something that can be selected or dragged.
    Pointer,
    /// A pan or drag is in progress.
    Grabbing,
    /// Guide mode is on.
    Crosshair,
}

impl Cursor {
    /// The CSS cursor keyword.
    #[must_use]
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Pointer => "pointer",
            Self::Grabbing => "grabbing",
            Self::Crosshair => "crosshair",
        }
    }
}
