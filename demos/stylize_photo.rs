//! Stylize example - turns a photo into steampunk art.
//!
//! Run with: `cargo run --example stylize_photo -- <photo.jpg>`
//!
//! Requires `STABILITY_KEY` environment variable.

use snapart::{ArtPipeline, ArtStyle, Config, RawImage, StyleOptions};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> snapart::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .expect("Usage: stylize_photo <photo.jpg>");

    let photo = RawImage::open(&input_path)?;
    let pipeline = ArtPipeline::from_config(&Config::from_env()?)?;

    let options = StyleOptions {
        control_strength: 0.6,
        ..StyleOptions::default()
    };

    let art = pipeline
        .stylize(
            photo,
            ArtStyle::SteampunkVictorian,
            &options,
            &CancellationToken::new(),
        )
        .await?;

    let output = format!("stylized.{}", art.format.extension());
    art.save(&output)?;
    println!(
        "Stylized image saved to {} ({} bytes, {}x{})",
        output,
        art.size(),
        art.width,
        art.height
    );

    Ok(())
}
