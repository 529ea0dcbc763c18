//! Bounded undo history of layer-collection snapshots.

use std::collections::VecDeque;

use crate::layer::Layer;

/// Default number of snapshots retained.
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// Undo stack holding structural clones of the layer collection.
///
/// Snapshots are pushed before a mutation and popped by undo. Once full, the
/// oldest snapshot is dropped first.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<Vec<Layer>>,
    max_depth: usize,
}

impl History {
    /// Create an empty history with the default depth.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_HISTORY_DEPTH)
    }

    /// Create a history with a custom depth.
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(max_depth.min(DEFAULT_HISTORY_DEPTH)),
            max_depth,
        }
    }

    /// Record a snapshot of `layers`.
    pub fn push(&mut self, layers: &[Layer]) {
        if self.max_depth == 0 {
            return;
        }
        // Drop oldest if at capacity
        while self.snapshots.len() >= self.max_depth {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(layers.to_vec());
    }

    /// Take the most recent snapshot, if any.
    pub fn pop(&mut self) -> Option<Vec<Layer>> {
        self.snapshots.pop_back()
    }

    /// Number of snapshots held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether undo has nothing to restore.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Maximum number of snapshots retained.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::layer::LayerId;

    fn layers(n: usize) -> Vec<Layer> {
        (0..n)
            .map(|i| {
                let id = LayerId::from_raw(format!("l{i}"));
                Layer::radial(id, format!("L{i}"), "#fff", Point::ORIGIN)
            })
            .collect()
    }

    #[test]
    fn test_push_pop_lifo() {
        let mut history = History::new();
        history.push(&layers(1));
        history.push(&layers(2));
        assert_eq!(history.pop().map(|l| l.len()), Some(2));
        assert_eq!(history.pop().map(|l| l.len()), Some(1));
        assert!(history.pop().is_none());
    }

    #[test]
    fn test_oldest_evicted_first() {
        let mut history = History::with_max_depth(3);
        for n in 1..=5 {
            history.push(&layers(n));
        }
        assert_eq!(history.len(), 3);
        let sizes: Vec<usize> = std::iter::from_fn(|| history.pop()).map(|l| l.len()).collect();
        assert_eq!(sizes, vec![5, 4, 3]);
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut history = History::new();
        let mut live = layers(1);
        history.push(&live);
        live[0].name = "changed".into();
        let restored = history.pop().expect("snapshot");
        assert_eq!(restored[0].name, "L0");
    }

    #[test]
    fn test_zero_depth_records_nothing() {
        let mut history = History::with_max_depth(0);
        history.push(&layers(1));
        assert!(history.is_empty());
    }
}
