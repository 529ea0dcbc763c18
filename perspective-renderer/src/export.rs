//! PNG export of overlay layers.
//!
//! Exports draw layers at the reference image's native size on a transparent
//! surface. The merged export is one PNG; the separated export emits one PNG
//! per visible layer into an [`ExportSink`], pausing between emissions so a
//! host that turns each emission into a download is not flooded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use perspective_core::export::{layer_plans, merged_plan, ExportPlan, EXPORT_REACH_FACTOR};
use perspective_core::project::now_ms;
use perspective_core::{ImageSize, Layer};

use crate::backend::skia::{frame_pixels, new_pixmap, paint_frame};
use crate::error::{RenderError, RenderResult};

/// Configuration for layer export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Ray length as a multiple of the larger image side.
    pub reach_factor: f64,
    /// Pause between separated-export emissions.
    pub separated_delay: Duration,
    /// Anti-alias strokes and markers.
    pub anti_aliasing: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            reach_factor: EXPORT_REACH_FACTOR,
            separated_delay: Duration::from_millis(250),
            anti_aliasing: true,
        }
    }
}

/// An encoded export ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    /// Suggested file name.
    pub file_name: String,
    /// PNG bytes.
    pub png: Vec<u8>,
}

/// Destination for exported images.
pub trait ExportSink {
    /// Accept one exported image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be stored.
    fn emit(&mut self, image: ExportedImage) -> RenderResult<()>;
}

impl ExportSink for Vec<ExportedImage> {
    fn emit(&mut self, image: ExportedImage) -> RenderResult<()> {
        self.push(image);
        Ok(())
    }
}

/// Writes each export into a directory under its suggested name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Target an existing directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// The target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in emission order.
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ExportSink for DirectorySink {
    fn emit(&mut self, image: ExportedImage) -> RenderResult<()> {
        let path = self.dir.join(&image.file_name);
        std::fs::write(&path, &image.png)?;
        tracing::debug!("Wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

/// Renders layers to PNG at native resolution.
pub struct LayerExporter {
    config: ExportConfig,
}

impl LayerExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// The exporter configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Rasterise and encode a single plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be allocated or encoding fails.
    pub fn render_plan(&self, plan: &ExportPlan) -> RenderResult<ExportedImage> {
        let (width, height) = frame_pixels(&plan.frame);
        let mut pixmap = new_pixmap(width, height)?;
        paint_frame(&mut pixmap, &plan.frame, None, self.config.anti_aliasing);
        let png = pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?;
        Ok(ExportedImage {
            file_name: plan.file_name.clone(),
            png,
        })
    }

    /// Export every visible layer onto one surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is empty or rendering fails.
    pub fn export_merged(&self, layers: &[Layer], image: ImageSize) -> RenderResult<ExportedImage> {
        check_image(image)?;
        let plan = merged_plan(layers, image, self.config.reach_factor, now_ms());
        let out = self.render_plan(&plan)?;
        tracing::info!("Exported {} ({} bytes)", out.file_name, out.png.len());
        Ok(out)
    }

    /// Export each visible layer to its own surface, emitting them in order.
    ///
    /// Returns the number of images emitted. Emission stops at the first
    /// error; images already emitted stay with the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is empty, rendering fails or the sink
    /// rejects an image.
    pub async fn export_separated<S: ExportSink>(
        &self,
        layers: &[Layer],
        image: ImageSize,
        sink: &mut S,
    ) -> RenderResult<usize> {
        check_image(image)?;
        let plans = layer_plans(layers, image, self.config.reach_factor);
        let total = plans.len();

        for (i, plan) in plans.iter().enumerate() {
            if i > 0 && !self.config.separated_delay.is_zero() {
                tokio::time::sleep(self.config.separated_delay).await;
            }
            let out = self.render_plan(plan)?;
            tracing::debug!("Emitting {} ({}/{total})", out.file_name, i + 1);
            sink.emit(out)?;
        }

        tracing::info!("Exported {total} separated layers");
        Ok(total)
    }
}

impl Default for LayerExporter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn check_image(image: ImageSize) -> RenderResult<()> {
    if image.is_empty() {
        return Err(RenderError::Export(format!(
            "Cannot export a {}x{} image",
            image.width, image.height
        )));
    }
    Ok(())
}
