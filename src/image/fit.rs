//! Fitting source photos into the service's pixel and byte budgets.
//!
//! Two passes, each of which only ever shrinks the image:
//!
//! 1. If the photo has more pixels than allowed, both sides are scaled by
//!    `sqrt(max / pixels)`. The factor is analytic, so this runs once.
//! 2. The result is JPEG-encoded at quality 1.0, then re-encoded one
//!    `quality_step` lower at a time until it fits in `max_byte_size` or the
//!    quality floor is reached. At the floor the smallest encoding wins, even
//!    if it is still over budget.

use crate::error::{Result, SnapArtError};
use crate::image::types::RawImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Cursor;

/// Maximum pixel count accepted by the structure-control endpoint.
pub const DEFAULT_MAX_PIXEL_COUNT: u64 = 9_000_000;
/// Maximum upload size accepted by the structure-control endpoint (1 MiB).
pub const DEFAULT_MAX_BYTE_SIZE: u64 = 1024 * 1024;
/// Default JPEG quality decrement per attempt.
pub const DEFAULT_QUALITY_STEP: f64 = 0.1;

/// Size budget a fitted image must satisfy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintProfile {
    /// Upper bound on `width * height`.
    pub max_pixel_count: u64,
    /// Upper bound on the encoded JPEG size in bytes.
    pub max_byte_size: u64,
    /// Quality decrement per re-encode, in (0, 1).
    pub quality_step: f64,
    /// Filter used by the pixel-count pass.
    pub resize_filter: FilterType,
}

impl Default for ConstraintProfile {
    fn default() -> Self {
        Self {
            max_pixel_count: DEFAULT_MAX_PIXEL_COUNT,
            max_byte_size: DEFAULT_MAX_BYTE_SIZE,
            quality_step: DEFAULT_QUALITY_STEP,
            resize_filter: FilterType::Lanczos3,
        }
    }
}

impl ConstraintProfile {
    /// Creates a validated profile with the default resize filter.
    pub fn new(max_pixel_count: u64, max_byte_size: u64, quality_step: f64) -> Result<Self> {
        let profile = Self {
            max_pixel_count,
            max_byte_size,
            quality_step,
            ..Self::default()
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Sets the filter used when downscaling.
    pub fn with_resize_filter(mut self, filter: FilterType) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Checks the budget is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_pixel_count == 0 {
            return Err(SnapArtError::InvalidRequest(
                "max pixel count must be positive".into(),
            ));
        }
        if self.max_byte_size == 0 {
            return Err(SnapArtError::InvalidRequest(
                "max byte size must be positive".into(),
            ));
        }
        if !(self.quality_step > 0.0 && self.quality_step < 1.0) {
            return Err(SnapArtError::InvalidRequest(format!(
                "quality step must be in (0, 1), got {}",
                self.quality_step
            )));
        }
        Ok(())
    }

    /// Upper bound on encode attempts for this profile.
    pub fn max_attempts(&self) -> u32 {
        (1.0 / self.quality_step).ceil() as u32
    }
}

/// A photo that satisfies a [`ConstraintProfile`], with its JPEG encoding.
#[derive(Debug, Clone)]
pub struct FittedImage {
    pixels: DynamicImage,
    jpeg: Vec<u8>,
    quality: f64,
    attempts: u32,
}

impl FittedImage {
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

    /// The JPEG bytes that get uploaded.
    pub fn jpeg_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    /// Size of the JPEG encoding.
    pub fn encoded_size(&self) -> u64 {
        self.jpeg.len() as u64
    }

    /// JPEG quality, in (0, 1], of the accepted encoding.
    pub fn quality(&self) -> f64 {
        self.quality
    }

    /// Number of encodes performed by the byte-size pass.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether both budgets of `profile` are met.
    pub fn fits(&self, profile: &ConstraintProfile) -> bool {
        self.pixel_count() <= profile.max_pixel_count
            && self.encoded_size() <= profile.max_byte_size
    }
}

impl From<FittedImage> for RawImage {
    fn from(fitted: FittedImage) -> Self {
        RawImage::from(fitted.pixels)
    }
}

/// Computes the dimensions produced by the pixel-count pass.
///
/// Aspect ratio is preserved up to flooring; each side is at least 1. When a
/// side bottoms out at 1 the other side is capped so the product stays within
/// `max_pixel_count`.
pub fn fitted_dimensions(width: u32, height: u32, max_pixel_count: u64) -> (u32, u32) {
    let pixels = width as u64 * height as u64;
    if pixels <= max_pixel_count {
        return (width, height);
    }

    let scale = (max_pixel_count as f64 / pixels as f64).sqrt();
    let mut new_w = ((width as f64 * scale).floor() as u32).max(1);
    let mut new_h = ((height as f64 * scale).floor() as u32).max(1);

    if new_w as u64 * new_h as u64 > max_pixel_count {
        if new_h == 1 {
            new_w = (max_pixel_count / new_h as u64).min(width as u64) as u32;
        } else {
            new_h = (max_pixel_count / new_w as u64).min(height as u64) as u32;
        }
    }
    (new_w, new_h)
}

/// Shrinks photos until they satisfy a [`ConstraintProfile`].
#[derive(Debug, Clone, Default)]
pub struct ConstraintFitter {
    profile: ConstraintProfile,
}

impl ConstraintFitter {
    /// Creates a fitter for `profile`.
    pub fn new(profile: ConstraintProfile) -> Self {
        Self { profile }
    }

    /// Returns the active profile.
    pub fn profile(&self) -> &ConstraintProfile {
        &self.profile
    }

    /// Fits `image` into the profile's budgets.
    pub fn fit(&self, image: &RawImage) -> Result<FittedImage> {
        self.profile.validate()?;

        let pixels = self.fit_pixels(image);
        let (jpeg, quality, attempts) = self.fit_bytes(&pixels)?;

        tracing::info!(
            source_width = image.width(),
            source_height = image.height(),
            width = pixels.width(),
            height = pixels.height(),
            bytes = jpeg.len(),
            quality,
            attempts,
            "fitted image"
        );

        Ok(FittedImage {
            pixels,
            jpeg,
            quality,
            attempts,
        })
    }

    fn fit_pixels(&self, image: &RawImage) -> DynamicImage {
        let (width, height) =
            fitted_dimensions(image.width(), image.height(), self.profile.max_pixel_count);
        if (width, height) == (image.width(), image.height()) {
            return image.pixels().clone();
        }

        tracing::debug!(
            from_width = image.width(),
            from_height = image.height(),
            width,
            height,
            "downscaling to pixel budget"
        );
        image
            .pixels()
            .resize_exact(width, height, self.profile.resize_filter)
    }

    fn fit_bytes(&self, pixels: &DynamicImage) -> Result<(Vec<u8>, f64, u32)> {
        let step = self.profile.quality_step;
        let max = self.profile.max_byte_size;

        let mut best = encode_jpeg(pixels, 1.0)?;
        let mut best_quality = 1.0;
        let mut attempts = 1;
        let mut quality = 1.0;

        // quality = 1 - attempts * step, never accumulated
        while best.len() as u64 > max && quality > step {
            quality = 1.0 - attempts as f64 * step;
            if quality <= 0.0 {
                break;
            }
            let encoded = encode_jpeg(pixels, quality)?;
            attempts += 1;
            tracing::debug!(quality, bytes = encoded.len(), max, "re-encoded at lower quality");
            if encoded.len() <= best.len() {
                best = encoded;
                best_quality = quality;
            }
        }

        if best.len() as u64 > max {
            tracing::warn!(
                bytes = best.len(),
                max,
                quality = best_quality,
                "quality floor reached, accepting image over byte budget"
            );
        }

        Ok((best, best_quality, attempts))
    }
}

/// Maps a quality in (0, 1] onto the JPEG encoder's 1..=100 scale.
fn jpeg_quality(quality: f64) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn encode_jpeg(pixels: &DynamicImage, quality: f64) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality));
    pixels
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| SnapArtError::Encoding(format!("JPEG encode failed: {e}")))?;
    Ok(buf.into_inner())
}
