//! # Perspective Core
//!
//! Layer model and interaction engine for perspective guide overlays drawn
//! over a reference image.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              perspective-core               │
//! ├─────────────────────────────────────────────┤
//! │  Layer Model     │  Interaction Engine      │
//! │  - Radial fans   │  - Pan / zoom view       │
//! │  - Ortho grids   │  - Hit-testing           │
//! │  - Geometry      │  - Gesture machine       │
//! ├─────────────────────────────────────────────┤
//! │  Document        │  Output                  │
//! │  - Undo history  │  - Workspace frames      │
//! │  - Project JSON  │  - Export plans          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Nothing here rasterises. [`Engine::frame`] and the export plans produce
//! [`Frame`]s that a backend paints op by op.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod event;
pub mod export;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod hit;
pub mod layer;
pub mod project;
pub mod render;
pub mod view;

pub use color::Rgba;
pub use config::{AlphaConfig, EngineConfig};
pub use document::LayerDocument;
pub use engine::Engine;
pub use error::{CoreError, CoreResult};
pub use event::{KeyModifiers, PointerButton, PointerEvent, WheelEvent};
pub use export::{ExportPlan, EXPORT_REACH_FACTOR};
pub use geometry::{ImageSize, LayerGeometry, Placement, Point, Segment, SurfaceSize};
pub use gesture::{Cursor, Gesture, GuideLine};
pub use hit::{Hit, HitPart, HitTolerance};
pub use layer::{Layer, LayerId, LayerKind, LayerPatch};
pub use project::{ProjectFile, PROJECT_VERSION};
pub use render::{DrawOp, Frame, LineCap, Outline, Rect, StrokeStyle, WorkspaceScene};
pub use view::ViewTransform;

/// Perspective core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
