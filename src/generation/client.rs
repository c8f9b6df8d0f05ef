//! HTTP client for the Stability AI structure-control endpoint.

use crate::config::Config;
use crate::error::{Result, SnapArtError};
use crate::generation::multipart::EncodedPayload;
use crate::generation::provider::ArtProvider;
use crate::image::types::{GeneratedImage, GenerationMetadata, ImageFormat};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Default structure-control endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://api.stability.ai/v2beta/stable-image/control/structure";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "STABILITY_KEY";

const FINISH_REASON_HEADER: &str = "finish-reason";
const SEED_HEADER: &str = "seed";
const CONTENT_FILTERED: &str = "CONTENT_FILTERED";

/// Builder for [`GenerationClient`].
#[derive(Debug, Clone, Default)]
pub struct GenerationClientBuilder {
    api_key: Option<String>,
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl GenerationClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `STABILITY_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets a whole-request timeout. No timeout by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client, resolving the API key and parsing the endpoint.
    pub fn build(self) -> Result<GenerationClient> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                SnapArtError::Auth(format!("{API_KEY_ENV} not set and no API key provided"))
            })?;

        let raw = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let endpoint =
            Url::parse(raw).map_err(|e| SnapArtError::InvalidUrl(format!("{raw}: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(SnapArtError::InvalidUrl(format!(
                "{raw}: unsupported scheme {}",
                endpoint.scheme()
            )));
        }

        let mut client = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }

        tracing::debug!(
            endpoint = %endpoint,
            key_len = api_key.len(),
            timeout_ms = self.timeout.map(|t| t.as_millis() as u64),
            "built generation client"
        );

        Ok(GenerationClient {
            client: client.build()?,
            api_key,
            endpoint,
        })
    }
}

/// Submits encoded payloads and classifies the responses.
pub struct GenerationClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: Url,
}

impl GenerationClient {
    /// Creates a new `GenerationClientBuilder`.
    pub fn builder() -> GenerationClientBuilder {
        GenerationClientBuilder::new()
    }

    /// Builds a client from a loaded [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Self::builder().endpoint(config.endpoint.clone());
        if let Some(key) = &config.api_key {
            builder = builder.api_key(key.clone());
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    /// Returns the endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn exchange(&self, payload: &EncodedPayload) -> Result<GeneratedImage> {
        let start = Instant::now();

        tracing::debug!(
            endpoint = %self.endpoint,
            bytes = payload.len(),
            "submitting generation request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(ACCEPT, "image/*")
            .header(CONTENT_TYPE, payload.content_type.as_str())
            .body(payload.body.clone())
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "received generation response"
        );

        if status != StatusCode::OK {
            return Err(api_error(status.as_u16(), &body));
        }

        if body.is_empty() {
            return Err(SnapArtError::InvalidResponse(
                "successful response carried no body".into(),
            ));
        }

        let mut metadata = response_metadata(&headers);
        metadata.duration_ms = Some(start.elapsed().as_millis() as u64);

        // Some failures arrive as a 200 carrying a JSON error document.
        if body.first() == Some(&b'{') {
            if let Some(message) = error_message(&body) {
                tracing::warn!(%message, "successful status carried an error document");
                return Err(SnapArtError::ImageGenerationFailed {
                    status: status.as_u16(),
                    message,
                });
            }
        }

        let fallback = response_format(&headers).unwrap_or_default();
        let image = GeneratedImage::decode(body, fallback, metadata)?;
        tracing::info!(
            bytes = image.size(),
            width = image.width,
            height = image.height,
            format = %image.format,
            "generation complete"
        );
        Ok(image)
    }
}

#[async_trait]
impl ArtProvider for GenerationClient {
    async fn generate(
        &self,
        payload: &EncodedPayload,
        cancel: &CancellationToken,
    ) -> Result<GeneratedImage> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("generation cancelled, dropping in-flight request");
                Err(SnapArtError::Cancelled)
            }
            result = self.exchange(payload) => result,
        }
    }

    fn name(&self) -> &str {
        "Stability AI (structure control)"
    }

    async fn health_check(&self) -> Result<()> {
        if self.api_key.starts_with("sk-") {
            Ok(())
        } else {
            Err(SnapArtError::Auth("Invalid API key format".into()))
        }
    }
}

/// Error body returned by the service on failure.
#[derive(Debug, Deserialize)]
struct ErrorDocument {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<String>,
}

/// Extracts a message from a JSON error document, if the body is one.
fn error_message(body: &[u8]) -> Option<String> {
    let doc: ErrorDocument = serde_json::from_slice(body).ok()?;
    if let Some(message) = doc.message {
        return Some(message);
    }
    if !doc.errors.is_empty() {
        return Some(doc.errors.join("; "));
    }
    None
}

fn api_error(status: u16, body: &[u8]) -> SnapArtError {
    let message =
        error_message(body).unwrap_or_else(|| format!("Failed with status code: {status}"));
    tracing::warn!(status, %message, "generation request rejected");
    SnapArtError::ImageGenerationFailed { status, message }
}

fn response_metadata(headers: &HeaderMap) -> GenerationMetadata {
    let finish_reason = header_str(headers, FINISH_REASON_HEADER).map(str::to_string);
    let seed = header_str(headers, SEED_HEADER).and_then(|s| s.parse().ok());
    GenerationMetadata {
        seed,
        safety_filtered: finish_reason.as_deref() == Some(CONTENT_FILTERED),
        finish_reason,
        duration_ms: None,
    }
}

fn response_format(headers: &HeaderMap) -> Option<ImageFormat> {
    header_str(headers, CONTENT_TYPE.as_str())?
        .strip_prefix("image/")
        .and_then(ImageFormat::from_extension)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}
