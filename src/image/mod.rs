//! Image types and size fitting.

pub mod fit;
pub(crate) mod types;

pub use fit::{fitted_dimensions, ConstraintFitter, ConstraintProfile, FittedImage};
pub use types::{GeneratedImage, GenerationMetadata, ImageFormat, RawImage};
