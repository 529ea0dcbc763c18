//! Error types for layer and project operations.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
///
/// None of these are fatal: every variant leaves the current layer
/// collection untouched and is meant to be surfaced as a notification.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Layer not found in the collection.
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    /// A layer could not be created because no reference image is loaded.
    #[error("No reference image loaded")]
    NoImage,

    /// A project file did not contain a `layers` field.
    #[error("Project is missing the `layers` field")]
    MissingLayers,

    /// A project file contained layers that violate the layer invariants.
    #[error("Invalid layer in project: {0}")]
    InvalidLayer(String),

    /// Project serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
