//! Caller-facing summary of a generation attempt.

use crate::error::{Result, SnapArtError};
use crate::image::types::GeneratedImage;

/// The result of one generation attempt, flattened for presentation.
#[derive(Debug)]
pub enum GenerationOutcome {
    /// The service returned a decodable image.
    Success(GeneratedImage),
    /// The service rejected the request with a message.
    ApiError {
        /// Message reported by the service, verbatim.
        message: String,
        /// HTTP status of the response.
        status: u16,
    },
    /// No response reached us.
    TransportError(String),
    /// Anything else: local encode failures, bad responses, cancellation.
    Failed(SnapArtError),
}

impl GenerationOutcome {
    /// Whether an image was produced.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Text to show the user when the attempt did not produce an image.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Success(_) => None,
            Self::ApiError { message, .. } => Some(message.clone()),
            Self::TransportError(cause) => Some(format!("network error: {cause}")),
            Self::Failed(e) => Some(e.to_string()),
        }
    }
}

impl From<Result<GeneratedImage>> for GenerationOutcome {
    fn from(result: Result<GeneratedImage>) -> Self {
        match result {
            Ok(image) => Self::Success(image),
            Err(SnapArtError::ImageGenerationFailed { status, message }) => {
                Self::ApiError { message, status }
            }
            Err(SnapArtError::Network(e)) => Self::TransportError(e.to_string()),
            Err(e) => Self::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_maps_to_api_error() {
        let outcome = GenerationOutcome::from(Err(SnapArtError::ImageGenerationFailed {
            status: 403,
            message: "bad key".into(),
        }));
        match &outcome {
            GenerationOutcome::ApiError { message, status } => {
                assert_eq!(message, "bad key");
                assert_eq!(*status, 403);
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
        assert_eq!(outcome.user_message().as_deref(), Some("bad key"));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_local_errors_map_to_failed() {
        let outcome = GenerationOutcome::from(Err(SnapArtError::Encoding("boom".into())));
        assert!(matches!(outcome, GenerationOutcome::Failed(SnapArtError::Encoding(_))));

        let outcome = GenerationOutcome::from(Err(SnapArtError::Cancelled));
        assert_eq!(outcome.user_message().as_deref(), Some("generation cancelled"));
    }
}
