//! The interactive controller.
//!
//! [`Engine`] owns the layer document, the view transform, the gesture in
//! flight and the guide-mode state. Hosts feed it pointer and wheel events
//! and pull a [`Frame`] whenever they want to repaint.

use crate::config::EngineConfig;
use crate::document::LayerDocument;
use crate::event::{PointerButton, PointerEvent, WheelEvent};
use crate::export::{layer_plans, merged_plan, ExportPlan, EXPORT_REACH_FACTOR};
use crate::geometry::{ImageSize, Point, SurfaceSize};
use crate::gesture::{Cursor, Gesture, GuideLine};
use crate::hit::{hit_test, Hit, HitPart, HitTolerance};
use crate::layer::{Layer, LayerId, LayerPatch};
use crate::project::{now_ms, ProjectFile};
use crate::render::{Frame, WorkspaceScene};
use crate::view::ViewTransform;
use crate::{CoreError, CoreResult};

/// Interactive engine state.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    tolerance: HitTolerance,
    document: LayerDocument,
    view: ViewTransform,
    gesture: Gesture,
    hovered: Option<LayerId>,
    guide_mode: bool,
    guides: Vec<GuideLine>,
    image: Option<ImageSize>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Create an engine with no image, no layers and a zero-size viewport.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let config = config.sanitized();
        Self {
            tolerance: HitTolerance::from(&config),
            document: LayerDocument::with_history_depth(config.history_depth),
            view: ViewTransform::new(config.default_zoom, SurfaceSize::new(0.0, 0.0)),
            gesture: Gesture::Idle,
            hovered: None,
            guide_mode: false,
            guides: Vec::new(),
            image: None,
            config,
        }
    }

    // --- Accessors ---

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The layer document.
    #[must_use]
    pub fn document(&self) -> &LayerDocument {
        &self.document
    }

    /// Layers in draw order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        self.document.layers()
    }

    /// Current pan/zoom.
    #[must_use]
    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    /// The gesture in flight.
    #[must_use]
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Layer under the pointer, if any.
    #[must_use]
    pub fn hovered(&self) -> Option<&LayerId> {
        self.hovered.as_ref()
    }

    /// Reference image size, if an image is loaded.
    #[must_use]
    pub fn image(&self) -> Option<ImageSize> {
        self.image
    }

    /// Whether guide mode is on.
    #[must_use]
    pub fn guide_mode(&self) -> bool {
        self.guide_mode
    }

    /// Committed guide lines in screen coordinates.
    #[must_use]
    pub fn guides(&self) -> &[GuideLine] {
        &self.guides
    }

    // --- Surface and image ---

    /// Resize the viewport.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.view.viewport = SurfaceSize::new(width.max(0.0), height.max(0.0));
    }

    /// Install a new reference image.
    ///
    /// When the collection is empty a default radial layer at the image
    /// centre is created and made active; its ID is returned.
    pub fn set_image(&mut self, size: ImageSize) -> Option<LayerId> {
        tracing::info!("Reference image set: {}x{}", size.width, size.height);
        self.image = Some(size);
        if self.document.is_empty() {
            Some(self.document.add_radial(None))
        } else {
            None
        }
    }

    // --- Layer operations ---

    /// Append a radial layer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoImage`] when no reference image is loaded.
    pub fn add_radial_layer(&mut self, point: Option<Point>) -> CoreResult<LayerId> {
        self.require_image()?;
        Ok(self.document.add_radial(point))
    }

    /// Append a grid layer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoImage`] when no reference image is loaded.
    pub fn add_grid_layer(&mut self) -> CoreResult<LayerId> {
        self.require_image()?;
        Ok(self.document.add_grid())
    }

    /// Delete a layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn delete_layer(&mut self, id: &LayerId) -> CoreResult<()> {
        self.document.delete(id)?;
        self.settle();
        Ok(())
    }

    /// Remove every layer.
    pub fn clear_layers(&mut self) {
        self.document.clear();
        self.settle();
    }

    /// Flip a layer's visibility.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn toggle_visibility(&mut self, id: &LayerId) -> CoreResult<bool> {
        let visible = self.document.toggle_visibility(id)?;
        self.settle();
        Ok(visible)
    }

    /// Flip a layer's lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn toggle_lock(&mut self, id: &LayerId) -> CoreResult<bool> {
        let locked = self.document.toggle_lock(id)?;
        self.settle();
        Ok(locked)
    }

    /// Set or clear the active layer.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` names no layer.
    pub fn set_active(&mut self, id: Option<LayerId>) -> CoreResult<()> {
        self.document.set_active(id)
    }

    /// Edit the active layer's properties.
    ///
    /// # Errors
    ///
    /// Returns an error if no layer is active.
    pub fn update_active(&mut self, patch: &LayerPatch) -> CoreResult<()> {
        self.document.update_active(patch)
    }

    /// Edit a layer's properties.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn update_layer(&mut self, id: &LayerId, patch: &LayerPatch) -> CoreResult<()> {
        self.document.update_layer(id, patch)
    }

    /// Restore the previous layer collection.
    pub fn undo(&mut self) -> bool {
        let restored = self.document.undo();
        if restored {
            self.settle();
        }
        restored
    }

    /// Replace the layers with those of a project file.
    ///
    /// # Errors
    ///
    /// Returns an error if the project is rejected; state is unchanged.
    pub fn load_project(&mut self, json: &str) -> CoreResult<()> {
        self.document.load_project(json)?;
        self.settle();
        Ok(())
    }

    /// Package the layers for saving.
    #[must_use]
    pub fn save_project(&self) -> ProjectFile {
        self.document.to_project()
    }

    // --- Guides ---

    /// Turn guide mode on or off. Turning it off drops an in-flight capture.
    pub fn set_guide_mode(&mut self, on: bool) {
        if self.guide_mode == on {
            return;
        }
        self.guide_mode = on;
        if !on && matches!(self.gesture, Gesture::CapturingGuide(_)) {
            self.gesture = Gesture::Idle;
        }
        tracing::debug!("Guide mode {}", if on { "on" } else { "off" });
    }

    /// Drop every committed guide.
    pub fn clear_guides(&mut self) {
        self.guides.clear();
    }

    // --- View ---

    /// Apply a wheel zoom around the current centre.
    pub fn on_wheel(&mut self, event: WheelEvent) {
        let EngineConfig {
            wheel_sensitivity,
            min_zoom,
            max_zoom,
            ..
        } = self.config;
        self.view
            .zoom_by_wheel(event.delta_y, wheel_sensitivity, min_zoom, max_zoom);
    }

    /// Restore the default zoom and clear the pan.
    pub fn reset_view(&mut self) {
        self.view.reset(self.config.default_zoom);
    }

    // --- Pointer ---

    /// Top-most interactive layer under a screen position.
    #[must_use]
    pub fn hit_test(&self, screen: Point) -> Option<Hit> {
        let image = self.image?;
        hit_test(
            screen,
            self.document.layers(),
            &self.view.placement(image),
            &self.tolerance,
        )
    }

    /// Handle a button press.
    pub fn on_pointer_down(&mut self, event: PointerEvent) {
        if event.button != PointerButton::Primary || !self.gesture.is_idle() {
            return;
        }
        let pos = event.position;

        if self.guide_mode {
            self.begin(Gesture::CapturingGuide(GuideLine::at(pos)));
            return;
        }
        if event.modifiers.pans() {
            self.begin(Gesture::Panning { last: pos });
            return;
        }
        if self.image.is_none() {
            return;
        }

        match self.hit_test(pos) {
            Some(Hit {
                layer_id,
                part: HitPart::VanishingPoint(_),
            }) => {
                let origin = self
                    .document
                    .get(&layer_id)
                    .and_then(|l| l.points().first().copied());
                if let Err(e) = self.document.set_active(Some(layer_id.clone())) {
                    tracing::warn!("Cannot select hit layer: {e}");
                    return;
                }
                if let Some(origin) = origin {
                    self.document.checkpoint();
                    self.begin(Gesture::Dragging {
                        layer_id,
                        start: pos,
                        origin,
                    });
                }
            }
            Some(hit) => {
                if let Err(e) = self.document.set_active(Some(hit.layer_id)) {
                    tracing::warn!("Cannot select hit layer: {e}");
                }
            }
            None => {
                let at = self.view.screen_to_image(pos);
                let id = self.document.add_radial(Some(at));
                self.hovered = Some(id);
            }
        }
    }

    /// Handle pointer motion.
    pub fn on_pointer_move(&mut self, event: PointerEvent) {
        let pos = event.position;
        match &mut self.gesture {
            Gesture::Idle => {
                self.hovered = self.hit_test(pos).map(|hit| hit.layer_id);
            }
            Gesture::Panning { last } => {
                let (dx, dy) = (pos.x - last.x, pos.y - last.y);
                *last = pos;
                self.view.pan_by(dx, dy);
            }
            Gesture::Dragging {
                layer_id,
                start,
                origin,
            } => {
                let moved = Point::new(
                    origin.x + self.view.screen_dist_to_image(pos.x - start.x),
                    origin.y + self.view.screen_dist_to_image(pos.y - start.y),
                );
                let id = layer_id.clone();
                if let Err(e) = self.document.set_points(&id, vec![moved]) {
                    tracing::warn!("Drag target vanished: {e}");
                    self.end();
                }
            }
            Gesture::CapturingGuide(guide) => {
                guide.end = pos;
            }
        }
    }

    /// Handle a button release.
    pub fn on_pointer_up(&mut self, event: PointerEvent) {
        if let Gesture::CapturingGuide(mut guide) = self.gesture {
            guide.end = event.position;
            self.guides.push(guide);
            tracing::debug!("Committed guide ({} total)", self.guides.len());
        }
        self.end();
    }

    /// The pointer left the surface: abandon whatever was in flight.
    pub fn on_pointer_leave(&mut self) {
        if !self.gesture.is_idle() {
            tracing::debug!("Pointer left during {}, cancelling", self.gesture.label());
        }
        self.end();
        self.hovered = None;
    }

    /// Cursor the host should display.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        if self.guide_mode {
            Cursor::Crosshair
        } else if matches!(self.gesture, Gesture::Panning { .. } | Gesture::Dragging { .. }) {
            Cursor::Grabbing
        } else if self.hovered.is_some() {
            Cursor::Pointer
        } else {
            Cursor::Default
        }
    }

    // --- Output ---

    /// Build the workspace frame for the current state.
    #[must_use]
    pub fn frame(&self) -> Frame {
        let mut guides = self.guides.clone();
        if let Gesture::CapturingGuide(live) = &self.gesture {
            guides.push(*live);
        }
        WorkspaceScene {
            layers: self.document.layers(),
            active: self.document.active_id(),
            hovered: self.hovered.as_ref(),
            view: &self.view,
            image: self.image,
            guide_mode: self.guide_mode,
            guides: &guides,
            config: &self.config,
        }
        .build()
    }

    /// Plan the merged export.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoImage`] when no reference image is loaded.
    pub fn export_merged(&self) -> CoreResult<ExportPlan> {
        let image = self.require_image()?;
        Ok(merged_plan(self.document.layers(), image, EXPORT_REACH_FACTOR, now_ms()))
    }

    /// Plan one export per visible layer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoImage`] when no reference image is loaded.
    pub fn export_layers(&self) -> CoreResult<Vec<ExportPlan>> {
        let image = self.require_image()?;
        Ok(layer_plans(self.document.layers(), image, EXPORT_REACH_FACTOR))
    }

    // --- Internals ---

    fn require_image(&self) -> CoreResult<ImageSize> {
        self.image.ok_or(CoreError::NoImage)
    }

    fn begin(&mut self, gesture: Gesture) {
        tracing::debug!("Gesture {} -> {}", self.gesture.label(), gesture.label());
        self.gesture = gesture;
    }

    fn end(&mut self) {
        if !self.gesture.is_idle() {
            tracing::debug!("Gesture {} -> idle", self.gesture.label());
            self.gesture = Gesture::Idle;
        }
    }

    /// Drop references to layers a mutation made unreachable.
    fn settle(&mut self) {
        let reachable = |id: &LayerId| self.document.get(id).is_some_and(Layer::is_interactive);
        if self.hovered.as_ref().is_some_and(|id| !reachable(id)) {
            self.hovered = None;
        }
        if let Gesture::Dragging { layer_id, .. } = &self.gesture {
            if !reachable(layer_id) {
                self.gesture = Gesture::Idle;
            }
        }
    }
}
