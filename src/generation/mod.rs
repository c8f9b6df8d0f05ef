//! Request encoding and submission.

mod client;
mod multipart;
mod outcome;
mod provider;
mod request;

pub use client::{GenerationClient, GenerationClientBuilder, API_KEY_ENV, DEFAULT_ENDPOINT};
pub use multipart::{EncodedPayload, MultipartEncoder};
pub use outcome::GenerationOutcome;
pub use provider::ArtProvider;
pub use request::{GenerationRequest, DEFAULT_CONTROL_STRENGTH};
