//! Reference image loading.
//!
//! Supports raw encoded bytes, files on disk and `data:` URIs (base64 or
//! percent-encoded), the forms an upload or a paste hands over.

use std::path::Path;

use perspective_core::ImageSize;
use tiny_skia::{ColorU8, Pixmap};

use crate::backend::skia::new_pixmap;
use crate::error::{RenderError, RenderResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Self::Png
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Self::WebP
        } else {
            Self::Unknown
        }
    }
}

/// A decoded reference image, kept premultiplied for compositing.
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pixmap: Pixmap,
    format: ImageFormat,
}

impl ReferenceImage {
    /// Decode an image from encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be decoded or is empty.
    pub fn from_bytes(data: &[u8]) -> RenderResult<Self> {
        let format = ImageFormat::from_magic_bytes(data);
        let rgba = image::load_from_memory(data)
            .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::Resource("Image has no pixels".to_string()));
        }

        let mut pixmap = new_pixmap(width, height)?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        tracing::debug!("Decoded {format:?} reference image {width}x{height}");
        Ok(Self { pixmap, format })
    }

    /// Decode an image from a `data:` URI.
    ///
    /// Supports formats like `data:image/png;base64,iVBORw0KGgo...` and
    /// percent-encoded payloads.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is malformed or the image cannot be decoded.
    pub fn from_data_uri(uri: &str) -> RenderResult<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
        let (metadata, payload) = rest
            .split_once(',')
            .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

        let bytes = if metadata.ends_with(";base64") {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(payload.trim())
                .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
        } else {
            percent_decode(payload)?
        };

        Self::from_bytes(&bytes)
    }

    /// Read and decode an image file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub async fn load(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        tracing::info!("Loading reference image {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(&bytes)
    }

    /// Native size, as the layer engine expects it.
    #[must_use]
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.pixmap.width(), self.pixmap.height())
    }

    /// Native size as `(width, height)`.
    #[must_use]
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    /// Format sniffed from the encoded bytes.
    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Premultiplied pixels.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

/// Decode `%XX` escapes; other bytes pass through unchanged.
fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat as Codec, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(px));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, Codec::Png).expect("encode png");
        out.into_inner()
    }

    #[test]
    fn test_from_bytes_reports_size() {
        let image = ReferenceImage::from_bytes(&png_bytes(7, 3, [255, 0, 0, 255])).expect("decode");
        assert_eq!(image.size(), ImageSize::new(7, 3));
        assert_eq!(image.format(), ImageFormat::Png);
    }

    #[test]
    fn test_pixels_are_premultiplied() {
        let image =
            ReferenceImage::from_bytes(&png_bytes(1, 1, [200, 100, 0, 128])).expect("decode");
        let px = image.pixmap().pixel(0, 0).expect("pixel");
        assert_eq!(px.alpha(), 128);
        assert!(px.red() <= 101);
    }

    #[test]
    fn test_base64_data_uri() {
        use base64::Engine;
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(png_bytes(2, 2, [0, 0, 255, 255]));
        let uri = format!("data:image/png;base64,{encoded}");
        let image = ReferenceImage::from_data_uri(&uri).expect("decode");
        assert_eq!(image.size(), ImageSize::new(2, 2));
    }

    #[test]
    fn test_percent_encoded_data_uri() {
        let encoded: String = png_bytes(1, 1, [0, 0, 0, 255])
            .iter()
            .map(|b| format!("%{b:02X}"))
            .collect();
        let image =
            ReferenceImage::from_data_uri(&format!("data:image/png,{encoded}")).expect("decode");
        assert_eq!(image.size(), ImageSize::new(1, 1));
    }

    #[test]
    fn test_bad_inputs_are_errors() {
        assert!(ReferenceImage::from_data_uri("http://example.com/a.png").is_err());
        assert!(ReferenceImage::from_data_uri("data:image/png;base64").is_err());
        assert!(ReferenceImage::from_data_uri("data:image/png;base64,!!!").is_err());
        assert!(ReferenceImage::from_data_uri("data:image/png,%zz").is_err());
        assert!(ReferenceImage::from_bytes(b"not an image").is_err());
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_magic_bytes(b"RIFF\0\0\0\0WEBP"), ImageFormat::WebP);
        assert_eq!(ImageFormat::from_magic_bytes(b"xy"), ImageFormat::Unknown);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ref.png");
        std::fs::write(&path, png_bytes(5, 4, [1, 2, 3, 255])).expect("write");
        let image = ReferenceImage::load(&path).await.expect("load");
        assert_eq!(image.size(), ImageSize::new(5, 4));

        let missing = ReferenceImage::load(dir.path().join("nope.png")).await;
        assert!(matches!(missing, Err(RenderError::Io(_))));
    }
}
