//! The request sent to the structure-control endpoint.

use crate::image::fit::FittedImage;
use crate::image::types::ImageFormat;

/// Control strength used when none is given.
pub const DEFAULT_CONTROL_STRENGTH: f32 = 0.7;

/// A fitted photo plus the form fields that accompany it.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The photo to stylize.
    pub image: FittedImage,
    /// Text prompt describing the target style.
    pub prompt: String,
    /// What the output should avoid. May be empty.
    pub negative_prompt: String,
    control_strength: f32,
    /// Seed for deterministic generation (0 lets the service pick).
    pub seed: u64,
    /// Desired output format.
    pub output_format: ImageFormat,
}

impl GenerationRequest {
    /// Creates a request with default control strength, seed and format.
    pub fn new(image: FittedImage, prompt: impl Into<String>) -> Self {
        Self {
            image,
            prompt: prompt.into(),
            negative_prompt: String::new(),
            control_strength: DEFAULT_CONTROL_STRENGTH,
            seed: 0,
            output_format: ImageFormat::default(),
        }
    }

    /// Sets the negative prompt.
    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = negative_prompt.into();
        self
    }

    /// Sets the control strength, clamped to `[0, 1]`.
    ///
    /// NaN falls back to [`DEFAULT_CONTROL_STRENGTH`].
    pub fn with_control_strength(mut self, strength: f32) -> Self {
        self.control_strength = clamp_control_strength(strength);
        self
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the output format.
    pub fn with_output_format(mut self, format: ImageFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Control strength in `[0, 1]`.
    pub fn control_strength(&self) -> f32 {
        self.control_strength
    }
}

fn clamp_control_strength(strength: f32) -> f32 {
    if strength.is_nan() {
        tracing::warn!(
            default = DEFAULT_CONTROL_STRENGTH,
            "control strength is NaN, using default"
        );
        return DEFAULT_CONTROL_STRENGTH;
    }
    let clamped = strength.clamp(0.0, 1.0);
    if clamped != strength {
        tracing::warn!(requested = strength, clamped, "control strength clamped to [0, 1]");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::fit::ConstraintFitter;
    use crate::image::types::RawImage;
    use image::DynamicImage;

    fn fitted() -> FittedImage {
        ConstraintFitter::default()
            .fit(&RawImage::from(DynamicImage::new_rgb8(8, 8)))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let req = GenerationRequest::new(fitted(), "paint it");
        assert_eq!(req.prompt, "paint it");
        assert_eq!(req.negative_prompt, "");
        assert_eq!(req.control_strength(), 0.7);
        assert_eq!(req.seed, 0);
        assert_eq!(req.output_format, ImageFormat::WebP);
    }

    #[test]
    fn test_control_strength_clamped() {
        let req = GenerationRequest::new(fitted(), "p").with_control_strength(1.5);
        assert_eq!(req.control_strength(), 1.0);

        let req = GenerationRequest::new(fitted(), "p").with_control_strength(-0.2);
        assert_eq!(req.control_strength(), 0.0);

        let req = GenerationRequest::new(fitted(), "p").with_control_strength(0.35);
        assert_eq!(req.control_strength(), 0.35);
    }

    #[test]
    fn test_control_strength_nan_uses_default() {
        let req = GenerationRequest::new(fitted(), "p").with_control_strength(f32::NAN);
        assert_eq!(req.control_strength(), DEFAULT_CONTROL_STRENGTH);
    }
}
