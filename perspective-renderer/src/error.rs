//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering and export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Surface could not be allocated.
    #[error("Surface error: {0}")]
    Surface(String),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Export failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Core layer operation failed.
    #[error(transparent)]
    Core(#[from] perspective_core::CoreError),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
