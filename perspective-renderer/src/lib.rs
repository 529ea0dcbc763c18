//! # Perspective Renderer
//!
//! CPU rasteriser for perspective guide frames, plus reference image decoding
//! and PNG export.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────────┐   Frame    ┌──────────────┐   PNG   ┌────────────┐
//! │ perspective-core │ ─────────▶ │  tiny-skia   │ ──────▶ │ ExportSink │
//! │ Engine / plans   │            │  SkiaBackend │         │ Vec / dir  │
//! └──────────────────┘            └──────────────┘         └────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod error;
pub mod export;
pub mod image;

pub use backend::RenderBackend;
pub use error::{RenderError, RenderResult};
pub use export::{DirectorySink, ExportConfig, ExportSink, ExportedImage, LayerExporter};
pub use image::{ImageFormat, ReferenceImage};

use perspective_core::Frame;

/// Configuration for the renderer.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial surface width in pixels.
    pub width: u32,
    /// Initial surface height in pixels.
    pub height: u32,
    /// Enable anti-aliasing.
    pub anti_aliasing: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            anti_aliasing: true,
        }
    }
}

/// The main renderer interface.
pub struct Renderer {
    config: RendererConfig,
    backend: Box<dyn RenderBackend>,
    frame_count: u64,
}

impl Renderer {
    /// Create a new renderer with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be allocated.
    pub fn new(config: RendererConfig) -> RenderResult<Self> {
        let backend =
            backend::skia::SkiaBackend::new(config.width, config.height, config.anti_aliasing)?;
        tracing::debug!("Renderer using {} backend", backend.name());
        Ok(Self {
            config,
            backend: Box::new(backend),
            frame_count: 0,
        })
    }

    /// Render a frame, resizing the surface first if the frame asks for a
    /// different size.
    ///
    /// # Errors
    ///
    /// Returns an error if resizing or rendering fails.
    pub fn render(&mut self, frame: &Frame, image: Option<&ReferenceImage>) -> RenderResult<()> {
        let wanted = backend::skia::frame_pixels(frame);
        if wanted != self.backend.size() {
            self.backend.resize(wanted.0, wanted.1)?;
        }
        self.backend.render(frame, image)?;
        self.frame_count += 1;
        Ok(())
    }

    /// Get the current frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the renderer configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Current surface size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.backend.size()
    }

    /// Resize the rendering surface.
    ///
    /// # Errors
    ///
    /// Returns an error if resize fails.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.backend.resize(width, height)
    }

    /// Encode the last rendered frame as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn snapshot_png(&self) -> RenderResult<Vec<u8>> {
        self.backend.encode_png()
    }
}

/// Renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use perspective_core::{Engine, ImageSize};

    #[test]
    fn test_render_follows_frame_size() {
        let mut engine = Engine::default();
        engine.set_viewport(120.0, 90.0);
        engine.set_image(ImageSize::new(100, 50));

        let mut renderer = Renderer::new(RendererConfig::default()).expect("renderer");
        renderer.render(&engine.frame(), None).expect("render");
        assert_eq!(renderer.size(), (120, 90));
        assert_eq!(renderer.frame_count(), 1);

        let png = renderer.snapshot_png().expect("png");
        let decoded = ::image::load_from_memory(&png).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (120, 90));
    }
}
