//! Project file format.
//!
//! A project is `{ "version": "1.1", "layers": [...], "timestamp": <ms> }`.
//! Only `layers` is required when loading.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::layer::Layer;
use crate::{CoreError, CoreResult};

/// Version string written into saved projects.
pub const PROJECT_VERSION: &str = "1.1";

/// A saved project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Format version.
    pub version: String,
    /// The layer collection in draw order.
    pub layers: Vec<Layer>,
    /// Save time in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl ProjectFile {
    /// Wrap a layer collection for saving, stamped with the current time.
    #[must_use]
    pub fn new(layers: Vec<Layer>) -> Self {
        Self {
            version: PROJECT_VERSION.to_string(),
            layers,
            timestamp: now_ms(),
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(CoreError::Serialization)
    }

    /// Suggested download name, `perspective_project_<timestamp>.json`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("perspective_project_{}.json", self.timestamp)
    }
}

/// Extract and validate the layer list from project JSON.
///
/// Fields other than `layers` are ignored. Radial layers must carry at least
/// one vanishing point and ids must be unique.
///
/// # Errors
///
/// Returns [`CoreError::MissingLayers`] when `layers` is absent or null,
/// [`CoreError::Serialization`] when the JSON or a layer is malformed, and
/// [`CoreError::InvalidLayer`] when a layer breaks an invariant.
pub fn parse_layers(json: &str) -> CoreResult<Vec<Layer>> {
    let mut doc: serde_json::Value = serde_json::from_str(json)?;
    let raw = match doc.get_mut("layers").map(serde_json::Value::take) {
        None | Some(serde_json::Value::Null) => return Err(CoreError::MissingLayers),
        Some(raw) => raw,
    };
    let layers: Vec<Layer> = serde_json::from_value(raw)?;

    let mut seen = HashSet::with_capacity(layers.len());
    for layer in &layers {
        layer.validate().map_err(CoreError::InvalidLayer)?;
        if !seen.insert(&layer.id) {
            return Err(CoreError::InvalidLayer(format!("duplicate layer id {}", layer.id)));
        }
    }
    Ok(layers)
}

/// Current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
