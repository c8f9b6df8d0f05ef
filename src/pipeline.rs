//! End-to-end stylization: fit, encode, generate.

use crate::config::Config;
use crate::error::{Result, SnapArtError};
use crate::generation::{
    ArtProvider, GenerationClient, GenerationOutcome, GenerationRequest, MultipartEncoder,
    DEFAULT_CONTROL_STRENGTH,
};
use crate::image::{ConstraintFitter, ConstraintProfile, GeneratedImage, ImageFormat, RawImage};
use crate::styles::{ArtStyle, StyleCatalog};
use tokio_util::sync::CancellationToken;

/// Per-call generation options.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    /// Replaces the catalog prompt when set.
    pub prompt_override: Option<String>,
    /// Negative prompt; empty by default.
    pub negative_prompt: String,
    /// Structure adherence, clamped to `[0, 1]`.
    pub control_strength: f32,
    /// Seed; 0 lets the service choose.
    pub seed: u64,
    /// Format the service should return.
    pub output_format: ImageFormat,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            prompt_override: None,
            negative_prompt: String::new(),
            control_strength: DEFAULT_CONTROL_STRENGTH,
            seed: 0,
            output_format: ImageFormat::default(),
        }
    }
}

/// Runs the whole photo-to-art flow against a provider.
pub struct ArtPipeline<P = GenerationClient> {
    provider: P,
    fitter: ConstraintFitter,
    encoder: MultipartEncoder,
}

impl ArtPipeline<GenerationClient> {
    /// Builds a pipeline backed by the HTTP client described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = GenerationClient::from_config(config)?;
        Ok(Self::new(client, config.profile))
    }
}

impl<P: ArtProvider> ArtPipeline<P> {
    /// Creates a pipeline over `provider` with the given size budget.
    pub fn new(provider: P, profile: ConstraintProfile) -> Self {
        Self {
            provider,
            fitter: ConstraintFitter::new(profile),
            encoder: MultipartEncoder::new(),
        }
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fits `image` and builds the request for `style`.
    ///
    /// Fitting is CPU-bound and runs on the blocking pool.
    pub async fn prepare(
        &self,
        image: RawImage,
        style: ArtStyle,
        options: &StyleOptions,
    ) -> Result<GenerationRequest> {
        let fitter = self.fitter.clone();
        let fitted = tokio::task::spawn_blocking(move || fitter.fit(&image))
            .await
            .map_err(|e| SnapArtError::Encoding(format!("fitting task failed: {e}")))??;

        let prompt = options
            .prompt_override
            .clone()
            .unwrap_or_else(|| StyleCatalog::prompt_for(style).to_string());

        Ok(GenerationRequest::new(fitted, prompt)
            .with_negative_prompt(options.negative_prompt.clone())
            .with_control_strength(options.control_strength)
            .with_seed(options.seed)
            .with_output_format(options.output_format))
    }

    /// Turns `image` into `style` art.
    pub async fn stylize(
        &self,
        image: RawImage,
        style: ArtStyle,
        options: &StyleOptions,
        cancel: &CancellationToken,
    ) -> Result<GeneratedImage> {
        tracing::info!(
            style = %style,
            provider = self.provider.name(),
            width = image.width(),
            height = image.height(),
            "stylizing photo"
        );

        let request = self.prepare(image, style, options).await?;
        if cancel.is_cancelled() {
            return Err(SnapArtError::Cancelled);
        }

        let payload = self.encoder.encode(&request);
        self.provider.generate(&payload, cancel).await
    }

    /// Like [`stylize`](Self::stylize), flattened into a [`GenerationOutcome`].
    pub async fn stylize_outcome(
        &self,
        image: RawImage,
        style: ArtStyle,
        options: &StyleOptions,
        cancel: &CancellationToken,
    ) -> GenerationOutcome {
        self.stylize(image, style, options, cancel).await.into()
    }
}
