//! Error types for the stylization pipeline.

/// Errors that can occur while fitting, encoding or generating an image.
#[derive(Debug, thiserror::Error)]
pub enum SnapArtError {
    /// The configured endpoint could not be parsed as a URL.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// The response could not be interpreted (e.g. a 200 with no body).
    #[error("invalid response from server: {0}")]
    InvalidResponse(String),

    /// The service reported a structured failure. The message is verbatim.
    #[error("generation failed: {message}")]
    ImageGenerationFailed {
        /// HTTP status of the response.
        status: u16,
        /// Message reported by the service.
        message: String,
    },

    /// A successful response carried bytes that are not an image.
    #[error("unable to process the image data: {0}")]
    InvalidImageData(String),

    /// The local image could not be serialized before upload.
    #[error("failed to encode image data: {0}")]
    Encoding(String),

    /// The source photo is empty or cannot be decoded.
    #[error("could not decode source image: {0}")]
    SourceImage(String),

    /// API key missing or malformed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Configuration file or environment value is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No response reached us (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The caller cancelled the generation.
    #[error("generation cancelled")]
    Cancelled,

    /// I/O error (e.g., reading the photo or saving the result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SnapArtError {
    /// Returns true if a caller-driven retry has a reasonable chance of succeeding.
    ///
    /// Nothing in this crate retries on its own; this only informs whether a
    /// "try again" affordance makes sense.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::ImageGenerationFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns the HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ImageGenerationFailed { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, SnapArtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        let rate_limited = SnapArtError::ImageGenerationFailed {
            status: 429,
            message: "slow down".into(),
        };
        assert!(rate_limited.is_retryable());

        let server = SnapArtError::ImageGenerationFailed {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(server.is_retryable());

        let bad_key = SnapArtError::ImageGenerationFailed {
            status: 403,
            message: "bad key".into(),
        };
        assert!(!bad_key.is_retryable());
        assert!(!SnapArtError::InvalidUrl("::".into()).is_retryable());
        assert!(!SnapArtError::Encoding("jpeg".into()).is_retryable());
        assert!(!SnapArtError::Cancelled.is_retryable());
    }

    #[test]
    fn test_status() {
        let err = SnapArtError::ImageGenerationFailed {
            status: 400,
            message: "bad prompt".into(),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(SnapArtError::InvalidImageData("x".into()).status(), None);
    }

    #[test]
    fn test_error_display() {
        let err = SnapArtError::ImageGenerationFailed {
            status: 403,
            message: "bad key".into(),
        };
        assert_eq!(err.to_string(), "generation failed: bad key");

        let err = SnapArtError::InvalidUrl("not a url".into());
        assert_eq!(err.to_string(), "invalid API URL: not a url");

        assert_eq!(SnapArtError::Cancelled.to_string(), "generation cancelled");
    }
}
