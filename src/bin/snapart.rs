//! CLI for SnapArt - turn photos into stylized art.

use clap::{Args, Parser, Subcommand, ValueEnum};
use snapart::{
    ArtPipeline, ArtProvider, ArtStyle, Config, ConstraintFitter, ConstraintProfile,
    GenerationOutcome, ImageFormat, RawImage, StyleCatalog, StyleOptions,
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snapart")]
#[command(about = "Turn photos into art via the Stability AI structure-control API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stylize a photo
    Stylize(StylizeArgs),

    /// Fit a photo to the upload limits without calling the API
    Fit(FitArgs),

    /// List available art styles
    Styles,
}

#[derive(Args)]
struct StylizeArgs {
    /// Photo to stylize
    input: PathBuf,

    /// Output file path (extension selects the output format)
    #[arg(short, long)]
    output: PathBuf,

    /// Art style
    #[arg(short, long, value_enum, default_value = "whimsical-watercolor")]
    style: StyleArg,

    /// Custom prompt, replacing the style's prompt
    #[arg(long)]
    prompt: Option<String>,

    /// What the result should avoid
    #[arg(long, default_value = "")]
    negative_prompt: String,

    /// How closely to follow the photo's structure (0.0-1.0, clamped)
    #[arg(short, long)]
    control_strength: Option<f32>,

    /// Seed for deterministic generation (0 = random)
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Configuration file with KEY = value lines
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct FitArgs {
    /// Photo to fit
    input: PathBuf,

    /// Output JPEG path
    #[arg(short, long)]
    output: PathBuf,

    /// Maximum pixel count
    #[arg(long)]
    max_pixels: Option<u64>,

    /// Maximum encoded size in bytes
    #[arg(long)]
    max_bytes: Option<u64>,

    /// JPEG quality decrement per attempt
    #[arg(long)]
    quality_step: Option<f64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StyleArg {
    CyberpunkNeon,
    VintageSepia,
    WhimsicalWatercolor,
    BoldPopArt,
    SteampunkVictorian,
    MinimalistFlat,
    BaroquePainting,
    AbstractCubist,
}

impl From<StyleArg> for ArtStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::CyberpunkNeon => ArtStyle::CyberpunkNeon,
            StyleArg::VintageSepia => ArtStyle::VintageSepia,
            StyleArg::WhimsicalWatercolor => ArtStyle::WhimsicalWatercolor,
            StyleArg::BoldPopArt => ArtStyle::BoldPopArt,
            StyleArg::SteampunkVictorian => ArtStyle::SteampunkVictorian,
            StyleArg::MinimalistFlat => ArtStyle::MinimalistFlat,
            StyleArg::BaroquePainting => ArtStyle::BaroquePainting,
            StyleArg::AbstractCubist => ArtStyle::AbstractCubist,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("snapart=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stylize(args) => {
            stylize(args, cli.json).await?;
        }
        Commands::Fit(args) => {
            fit(args, cli.json)?;
        }
        Commands::Styles => {
            list_styles(cli.json)?;
        }
    }

    Ok(())
}

async fn stylize(args: StylizeArgs, json_output: bool) -> anyhow::Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let pipeline = ArtPipeline::from_config(&config)?;
    pipeline.provider().health_check().await?;
    let photo = RawImage::open(&args.input)?;
    let style = ArtStyle::from(args.style);

    let output_format = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension)
        .unwrap_or_default();

    let options = StyleOptions {
        prompt_override: args.prompt,
        negative_prompt: args.negative_prompt,
        control_strength: args.control_strength.unwrap_or(config.control_strength),
        seed: args.seed,
        output_format,
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling generation");
            on_interrupt.cancel();
        }
    });

    let outcome = pipeline
        .stylize_outcome(photo, style, &options, &cancel)
        .await;

    let image = match outcome {
        GenerationOutcome::Success(image) => image,
        failure => {
            let message = failure.user_message().unwrap_or_default();
            if json_output {
                let result = serde_json::json!({
                    "success": false,
                    "style": style.id(),
                    "error": message,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            anyhow::bail!(message);
        }
    };

    image.save(&args.output)?;

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "style": style.id(),
            "output": args.output.display().to_string(),
            "size_bytes": image.size(),
            "format": image.format.api_name(),
            "width": image.width,
            "height": image.height,
            "metadata": image.metadata,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated {} art: {} ({} bytes, {}x{})",
            StyleCatalog::title_for(style),
            args.output.display(),
            image.size(),
            image.width,
            image.height
        );
        if let Some(duration) = image.metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
        if image.metadata.safety_filtered {
            println!("Note: the service applied a content filter");
        }
    }

    Ok(())
}

fn fit(args: FitArgs, json_output: bool) -> anyhow::Result<()> {
    let defaults = ConstraintProfile::default();
    let profile = ConstraintProfile::new(
        args.max_pixels.unwrap_or(defaults.max_pixel_count),
        args.max_bytes.unwrap_or(defaults.max_byte_size),
        args.quality_step.unwrap_or(defaults.quality_step),
    )?;

    let photo = RawImage::open(&args.input)?;
    let (source_width, source_height) = (photo.width(), photo.height());
    let fitted = ConstraintFitter::new(profile).fit(&photo)?;
    std::fs::write(&args.output, fitted.jpeg_bytes())?;

    if json_output {
        let result = serde_json::json!({
            "output": args.output.display().to_string(),
            "source": { "width": source_width, "height": source_height },
            "width": fitted.width(),
            "height": fitted.height(),
            "size_bytes": fitted.encoded_size(),
            "quality": fitted.quality(),
            "attempts": fitted.attempts(),
            "within_budget": fitted.fits(&profile),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Fitted {}x{} -> {}x{}: {} ({} bytes, quality {:.2})",
            source_width,
            source_height,
            fitted.width(),
            fitted.height(),
            args.output.display(),
            fitted.encoded_size(),
            fitted.quality()
        );
        if !fitted.fits(&profile) {
            println!("Warning: still over the byte budget at the lowest quality");
        }
    }

    Ok(())
}

fn list_styles(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(StyleCatalog::all())?);
    } else {
        println!("Available styles:\n");
        for style in StyleCatalog::all() {
            println!("  {} ({})", style.title, style.id);
            println!("    {}", style.prompt);
        }
    }

    Ok(())
}
