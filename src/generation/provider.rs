//! Provider trait for the generation step.

use crate::error::Result;
use crate::generation::multipart::EncodedPayload;
use crate::image::types::GeneratedImage;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Something that turns an encoded payload into a generated image.
#[async_trait]
pub trait ArtProvider: Send + Sync {
    /// Submits `payload` once. Cancelling `cancel` aborts the exchange.
    async fn generate(
        &self,
        payload: &EncodedPayload,
        cancel: &CancellationToken,
    ) -> Result<GeneratedImage>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks the provider is configured well enough to attempt a request.
    async fn health_check(&self) -> Result<()>;
}
