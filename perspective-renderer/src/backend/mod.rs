//! Rendering backend implementations.

pub mod skia;

use perspective_core::Frame;

use crate::image::ReferenceImage;
use crate::RenderResult;

/// Trait for rendering backends.
pub trait RenderBackend {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Paint a frame, replacing the previous contents.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, frame: &Frame, image: Option<&ReferenceImage>) -> RenderResult<()>;

    /// Resize the rendering surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be reallocated.
    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()>;

    /// Current surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Encode the current surface as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    fn encode_png(&self) -> RenderResult<Vec<u8>>;
}
