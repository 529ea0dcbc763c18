//! The ordered layer collection, active selection and undo history.

use std::sync::Arc;

use crate::geometry::Point;
use crate::history::History;
use crate::layer::{Layer, LayerId, LayerKind, LayerPatch, PRESET_COLORS};
use crate::project::{parse_layers, ProjectFile};
use crate::{CoreError, CoreResult};

/// The layer collection being edited.
///
/// Layers are kept in draw order: index 0 is drawn first, the last layer is
/// drawn on top and hit-tested first. The collection lives behind an [`Arc`]
/// and every mutation installs a new one, so a reader holding
/// [`LayerDocument::snapshot`] never sees a partially applied change.
#[derive(Debug, Clone, Default)]
pub struct LayerDocument {
    layers: Arc<Vec<Layer>>,
    active: Option<LayerId>,
    history: History,
}

impl LayerDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document with a custom undo depth.
    #[must_use]
    pub fn with_history_depth(depth: usize) -> Self {
        Self {
            history: History::with_max_depth(depth),
            ..Self::default()
        }
    }

    // --- Queries ---

    /// All layers in draw order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// A shared handle to the current collection.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Layer>> {
        Arc::clone(&self.layers)
    }

    /// Get a layer by ID.
    #[must_use]
    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The active layer's ID, if any.
    #[must_use]
    pub fn active_id(&self) -> Option<&LayerId> {
        self.active.as_ref()
    }

    /// The active layer, if any.
    #[must_use]
    pub fn active_layer(&self) -> Option<&Layer> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    /// Whether undo would restore anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Number of snapshots available to undo.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    // --- Selection ---

    /// Set or clear the active layer.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` names no layer.
    pub fn set_active(&mut self, id: Option<LayerId>) -> CoreResult<()> {
        if let Some(id) = &id {
            if self.get(id).is_none() {
                return Err(CoreError::LayerNotFound(id.to_string()));
            }
        }
        self.active = id;
        Ok(())
    }

    // --- Creation ---

    /// Append a radial layer with a single vanishing point and make it active.
    ///
    /// The point defaults to the image centre.
    pub fn add_radial(&mut self, point: Option<Point>) -> LayerId {
        let n = self.layers.len();
        let layer = Layer::radial(
            LayerId::generate(),
            format!("Vanishing Point {}", n + 1),
            PRESET_COLORS[n % PRESET_COLORS.len()],
            point.unwrap_or(Point::ORIGIN),
        );
        self.append(layer)
    }

    /// Append a grid layer and make it active.
    pub fn add_grid(&mut self) -> LayerId {
        let n = self.layers.len();
        let layer = Layer::grid(
            LayerId::generate(),
            format!("Reference Grid {}", n + 1),
            PRESET_COLORS[n % PRESET_COLORS.len()],
        );
        self.append(layer)
    }

    fn append(&mut self, layer: Layer) -> LayerId {
        let id = layer.id.clone();
        tracing::debug!("Adding {} layer {id} ({})", layer.kind.label(), layer.name);
        self.commit(|layers| layers.push(layer));
        self.active = Some(id.clone());
        id
    }

    // --- Mutation ---

    /// Delete a layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn delete(&mut self, id: &LayerId) -> CoreResult<Layer> {
        let index = self.index_of(id)?;
        let removed = self.layers[index].clone();
        self.commit(|layers| {
            layers.remove(index);
        });
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        tracing::debug!("Deleted layer {id}");
        Ok(removed)
    }

    /// Remove every layer.
    pub fn clear(&mut self) {
        if self.layers.is_empty() {
            return;
        }
        self.commit(Vec::clear);
        self.active = None;
        tracing::debug!("Cleared all layers");
    }

    /// Flip a layer's visibility, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn toggle_visibility(&mut self, id: &LayerId) -> CoreResult<bool> {
        let index = self.index_of(id)?;
        let visible = !self.layers[index].visible;
        self.commit(|layers| layers[index].visible = visible);
        tracing::debug!("Layer {id} visible={visible}");
        Ok(visible)
    }

    /// Flip a layer's lock, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn toggle_lock(&mut self, id: &LayerId) -> CoreResult<bool> {
        let index = self.index_of(id)?;
        let locked = !self.layers[index].locked;
        self.commit(|layers| layers[index].locked = locked);
        tracing::debug!("Layer {id} locked={locked}");
        Ok(locked)
    }

    /// Apply a property edit to a layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn update_layer(&mut self, id: &LayerId, patch: &LayerPatch) -> CoreResult<()> {
        let index = self.index_of(id)?;
        self.commit(|layers| layers[index].apply(patch));
        tracing::debug!("Updated layer {id}: {patch:?}");
        Ok(())
    }

    /// Apply a property edit to the active layer.
    ///
    /// # Errors
    ///
    /// Returns an error if no layer is active.
    pub fn update_active(&mut self, patch: &LayerPatch) -> CoreResult<()> {
        let id = self
            .active
            .clone()
            .ok_or_else(|| CoreError::LayerNotFound("no active layer".to_string()))?;
        self.update_layer(&id, patch)
    }

    /// Record the current collection so the next [`undo`](Self::undo) returns to it.
    pub fn checkpoint(&mut self) {
        self.history.push(&self.layers);
    }

    /// Replace a radial layer's vanishing points without recording history.
    ///
    /// Used while a drag is in flight; the drag records one checkpoint up
    /// front. Empty `points` and grid layers are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn set_points(&mut self, id: &LayerId, points: Vec<Point>) -> CoreResult<()> {
        let index = self.index_of(id)?;
        if points.is_empty() || !self.layers[index].kind.is_radial() {
            return Ok(());
        }
        let mut next = self.layers.as_ref().clone();
        if let LayerKind::Radial { points: slot, .. } = &mut next[index].kind {
            *slot = points;
        }
        self.layers = Arc::new(next);
        Ok(())
    }

    /// Restore the most recent snapshot. Returns `false` when history is empty.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        self.layers = Arc::new(previous);
        if self.active.as_ref().is_some_and(|id| self.get(id).is_none()) {
            self.active = None;
        }
        tracing::debug!("Undo: restored {} layers", self.layers.len());
        true
    }

    // --- Persistence ---

    /// Replace the collection with the layers from a project file.
    ///
    /// On success the previous collection is recorded for undo and the first
    /// loaded layer becomes active. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the project has no `layers` or they are invalid.
    pub fn load_project(&mut self, json: &str) -> CoreResult<()> {
        let layers = parse_layers(json).inspect_err(|e| {
            tracing::warn!("Project load rejected: {e}");
        })?;
        tracing::info!("Loaded project with {} layers", layers.len());
        self.checkpoint();
        self.active = layers.first().map(|l| l.id.clone());
        self.layers = Arc::new(layers);
        Ok(())
    }

    /// Package the collection for saving.
    #[must_use]
    pub fn to_project(&self) -> ProjectFile {
        ProjectFile::new(self.layers.as_ref().clone())
    }

    // --- Internals ---

    fn index_of(&self, id: &LayerId) -> CoreResult<usize> {
        self.layers
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| CoreError::LayerNotFound(id.to_string()))
    }

    /// Snapshot, build the next collection from a copy, then swap it in.
    fn commit(&mut self, edit: impl FnOnce(&mut Vec<Layer>)) {
        self.history.push(&self.layers);
        let mut next = self.layers.as_ref().clone();
        edit(&mut next);
        self.layers = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_appends_and_activates() {
        let mut doc = LayerDocument::new();
        let a = doc.add_radial(None);
        let b = doc.add_grid();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.layers()[0].id, a);
        assert_eq!(doc.layers()[1].id, b);
        assert_eq!(doc.active_id(), Some(&b));
        assert_eq!(doc.layers()[0].name, "Vanishing Point 1");
        assert_eq!(doc.layers()[1].name, "Reference Grid 2");
        assert_eq!(doc.layers()[1].color, PRESET_COLORS[1]);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut doc = LayerDocument::new();
        let a = doc.add_radial(None);
        doc.delete(&a).expect("delete");
        let b = doc.add_radial(None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_delete_clears_active() {
        let mut doc = LayerDocument::new();
        let a = doc.add_radial(None);
        doc.delete(&a).expect("delete");
        assert!(doc.active_id().is_none());
        assert!(matches!(doc.delete(&a), Err(CoreError::LayerNotFound(_))));
    }

    #[test]
    fn test_undo_restores_exact_snapshot() {
        let mut doc = LayerDocument::new();
        let a = doc.add_radial(Some(Point::new(3.0, 4.0)));
        doc.add_grid();
        let before: Vec<Layer> = doc.layers().to_vec();

        doc.update_layer(&a, &LayerPatch {
            density: Some(2),
            color: Some("#000000".into()),
            ..Default::default()
        })
        .expect("update");
        assert_ne!(doc.layers(), before.as_slice());

        assert!(doc.undo());
        assert_eq!(doc.layers(), before.as_slice());
    }

    #[test]
    fn test_undo_past_depth_is_noop() {
        let mut doc = LayerDocument::with_history_depth(2);
        doc.add_radial(None);
        doc.add_radial(None);
        doc.add_radial(None);
        assert_eq!(doc.undo_depth(), 2);
        assert!(doc.undo());
        assert!(doc.undo());
        let state: Vec<Layer> = doc.layers().to_vec();
        assert_eq!(state.len(), 1);
        assert!(!doc.undo());
        assert_eq!(doc.layers(), state.as_slice());
    }

    #[test]
    fn test_toggles_record_history() {
        let mut doc = LayerDocument::new();
        let a = doc.add_grid();
        assert!(!doc.toggle_visibility(&a).expect("toggle"));
        assert!(doc.toggle_lock(&a).expect("toggle"));
        assert_eq!(doc.undo_depth(), 3);
        doc.undo();
        assert!(!doc.get(&a).expect("layer").locked);
    }

    #[test]
    fn test_snapshot_unaffected_by_later_mutation() {
        let mut doc = LayerDocument::new();
        let a = doc.add_radial(None);
        let frozen = doc.snapshot();
        doc.set_points(&a, vec![Point::new(9.0, 9.0)]).expect("points");
        assert_eq!(frozen[0].points(), &[Point::ORIGIN]);
        assert_eq!(doc.layers()[0].points(), &[Point::new(9.0, 9.0)]);
    }

    #[test]
    fn test_set_points_refuses_empty() {
        let mut doc = LayerDocument::new();
        let a = doc.add_radial(None);
        doc.set_points(&a, Vec::new()).expect("points");
        assert_eq!(doc.layers()[0].points().len(), 1);
    }

    #[test]
    fn test_update_active_requires_selection() {
        let mut doc = LayerDocument::new();
        assert!(doc.update_active(&LayerPatch::default()).is_err());
        doc.add_grid();
        doc.update_active(&LayerPatch {
            density_y: Some(4),
            ..Default::default()
        })
        .expect("update");
        assert_eq!(doc.layers()[0].kind, LayerKind::Grid { density: 10, density_y: 4 });
    }

    #[test]
    fn test_failed_project_load_leaves_state() {
        let mut doc = LayerDocument::new();
        doc.add_radial(None);
        let before = doc.layers().to_vec();
        let depth = doc.undo_depth();
        assert!(matches!(doc.load_project(r#"{"version":"1.1"}"#), Err(CoreError::MissingLayers)));
        assert_eq!(doc.layers(), before.as_slice());
        assert_eq!(doc.undo_depth(), depth);
    }

    #[test]
    fn test_project_load_activates_first_and_is_undoable() {
        let mut source = LayerDocument::new();
        source.add_grid();
        source.add_radial(Some(Point::new(1.0, 1.0)));
        let json = source.to_project().to_json().expect("json");

        let mut doc = LayerDocument::new();
        doc.add_radial(None);
        doc.load_project(&json).expect("load");
        assert_eq!(doc.layers(), source.layers());
        assert_eq!(doc.active_id(), Some(&source.layers()[0].id));

        assert!(doc.undo());
        assert_eq!(doc.len(), 1);
        assert!(doc.active_id().is_none());
    }

    #[test]
    fn test_clear_is_undoable() {
        let mut doc = LayerDocument::new();
        doc.add_radial(None);
        doc.add_grid();
        doc.clear();
        assert!(doc.is_empty());
        assert!(doc.undo());
        assert_eq!(doc.len(), 2);
    }
}
