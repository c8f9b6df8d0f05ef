#![warn(missing_docs)]
//! SnapArt - turn photos into stylized art.
//!
//! A photo is shrunk until it fits the Stability AI structure-control
//! endpoint's pixel and byte limits, packed into a `multipart/form-data` body
//! together with a style prompt, and submitted. The response is either the
//! generated image or a typed error.
//!
//! # Quick Start
//!
//! ```no_run
//! use snapart::{ArtPipeline, ArtStyle, Config, RawImage, StyleOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> snapart::Result<()> {
//!     let config = Config::from_env()?;
//!     let pipeline = ArtPipeline::from_config(&config)?;
//!     let photo = RawImage::open("photo.jpg")?;
//!     let art = pipeline
//!         .stylize(
//!             photo,
//!             ArtStyle::WhimsicalWatercolor,
//!             &StyleOptions::default(),
//!             &CancellationToken::new(),
//!         )
//!         .await?;
//!     art.save("art.webp")?;
//!     Ok(())
//! }
//! ```
//!
//! # Building blocks
//!
//! - [`ConstraintFitter`]: pixel-count and byte-size fitting
//! - [`MultipartEncoder`]: request body assembly
//! - [`GenerationClient`]: HTTP submission and response classification
//! - [`StyleCatalog`]: style titles and prompts
//!
//! # Features
//!
//! - `cli` (default): the `snapart` command-line interface

pub mod config;
mod error;
pub mod generation;
pub mod image;
pub mod pipeline;
pub mod styles;

// Re-export error types at crate root
pub use error::{Result, SnapArtError};

pub use config::Config;
pub use generation::{
    ArtProvider, EncodedPayload, GenerationClient, GenerationClientBuilder, GenerationOutcome,
    GenerationRequest, MultipartEncoder,
};
// `crate::` keeps this from resolving to the `image` dependency.
pub use crate::image::{
    ConstraintFitter, ConstraintProfile, FittedImage, GeneratedImage, GenerationMetadata,
    ImageFormat, RawImage,
};
pub use pipeline::{ArtPipeline, StyleOptions};
pub use styles::{ArtStyle, StyleCatalog, StyleDescriptor};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, SnapArtError};
    pub use crate::generation::{ArtProvider, GenerationClient, GenerationOutcome};
    pub use crate::image::{ConstraintProfile, GeneratedImage, RawImage};
    pub use crate::pipeline::{ArtPipeline, StyleOptions};
    pub use crate::styles::{ArtStyle, StyleCatalog};
}
