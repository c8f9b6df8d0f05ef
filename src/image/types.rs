//! Core image types: source photos, output formats and generated results.

use crate::error::{Result, SnapArtError};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats the service can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// WebP format (compact, the service default here).
    #[default]
    WebP,
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
}

impl ImageFormat {
    /// Returns the value sent in the `output_format` form field.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "webp" => Some(Self::WebP),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

impl std::str::FromStr for ImageFormat {
    type Err = SnapArtError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s)
            .ok_or_else(|| SnapArtError::InvalidRequest(format!("unsupported output format: {s}")))
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

/// A decoded source photo, as captured by the caller.
#[derive(Debug, Clone)]
pub struct RawImage {
    pixels: DynamicImage,
}

impl RawImage {
    /// Decodes a photo from encoded bytes (JPEG, PNG, WebP, ...).
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(SnapArtError::SourceImage("image data is empty".into()));
        }
        let pixels = image::load_from_memory(data)
            .map_err(|e| SnapArtError::SourceImage(e.to_string()))?;
        Ok(Self { pixels })
    }

    /// Reads and decodes a photo from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Total pixel count.
    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Borrows the decoded bitmap.
    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

impl From<DynamicImage> for RawImage {
    fn from(pixels: DynamicImage) -> Self {
        Self { pixels }
    }
}

/// Metadata about the generation exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Seed reported by the service, if any.
    pub seed: Option<u64>,
    /// Value of the `finish-reason` response header.
    pub finish_reason: Option<String>,
    /// Round trip duration in milliseconds.
    pub duration_ms: Option<u64>,
    /// Whether the service applied a content filter to the output.
    pub safety_filtered: bool,
}

/// A generated image with its data and metadata.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved or processed"]
pub struct GeneratedImage {
    /// Raw image bytes, exactly as returned by the service.
    pub data: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
    /// Decoded width in pixels.
    pub width: u32,
    /// Decoded height in pixels.
    pub height: u32,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Decodes response bytes, keeping them untouched on success.
    ///
    /// `fallback` is used as the format when the magic bytes are not recognized.
    pub fn decode(
        data: Vec<u8>,
        fallback: ImageFormat,
        metadata: GenerationMetadata,
    ) -> Result<Self> {
        let decoded = image::load_from_memory(&data)
            .map_err(|e| SnapArtError::InvalidImageData(e.to_string()))?;
        let format = ImageFormat::from_magic_bytes(&data).unwrap_or(fallback);
        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            data,
            format,
            metadata,
        })
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}
