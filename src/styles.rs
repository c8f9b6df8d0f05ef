//! Art style catalog.
//!
//! A closed set of styles, each with a display title and the prompt sent to
//! the service. The table is static, so lookups by [`ArtStyle`] never fail.

use crate::error::{Result, SnapArtError};
use serde::Serialize;

/// Supported art styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArtStyle {
    /// Dark futuristic look with neon lighting.
    CyberpunkNeon,
    /// Warm old-photograph tones.
    VintageSepia,
    /// Soft pastel watercolor.
    #[default]
    WhimsicalWatercolor,
    /// Saturated comic-book graphics.
    BoldPopArt,
    /// Brass, gears and Victorian ornament.
    SteampunkVictorian,
    /// Clean shapes and flat colors.
    MinimalistFlat,
    /// Dramatic chiaroscuro painting.
    BaroquePainting,
    /// Geometric fragmentation.
    AbstractCubist,
}

/// Title and prompt for one style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleDescriptor {
    /// Stable kebab-case identifier.
    pub id: &'static str,
    /// Human-readable name.
    pub title: &'static str,
    /// Generation prompt describing the target aesthetic.
    pub prompt: &'static str,
}

// Indexed by `ArtStyle as usize`.
static DESCRIPTORS: [StyleDescriptor; 8] = [
    StyleDescriptor {
        id: "cyberpunk-neon",
        title: "Cyberpunk Neon",
        prompt: "Transform this image into a dark cyberpunk aesthetic with vibrant neon lights, high-contrast shadows, and a futuristic cityscape vibe.",
    },
    StyleDescriptor {
        id: "vintage-sepia",
        title: "Vintage Sepia",
        prompt: "Reinterpret this image in a warm, vintage sepia tone, reminiscent of old photographs, with soft grain and faded edges.",
    },
    StyleDescriptor {
        id: "whimsical-watercolor",
        title: "Whimsical Watercolor",
        prompt: "Repaint this image in a whimsical watercolor style using pastel colors, gentle brush strokes, and soft, diffused outlines.",
    },
    StyleDescriptor {
        id: "bold-pop-art",
        title: "Bold Pop Art",
        prompt: "Apply a bold pop art style with flat, saturated colors, thick black outlines, and a graphic, comic-book aesthetic.",
    },
    StyleDescriptor {
        id: "steampunk-victorian",
        title: "Steampunk Victorian",
        prompt: "Reimagine this image with a steampunk Victorian flair, featuring mechanical gears, brass tones, and an ornate, old-world industrial atmosphere.",
    },
    StyleDescriptor {
        id: "minimalist-flat",
        title: "Minimalist Flat",
        prompt: "Simplify this image into a minimalist flat art style, using clean shapes, flat colors, and a subdued color palette.",
    },
    StyleDescriptor {
        id: "baroque-painting",
        title: "Baroque Painting",
        prompt: "Render this image as a dramatic baroque-style painting, with rich, deep shadows, warm candlelit highlights, and ornate, classical detailing.",
    },
    StyleDescriptor {
        id: "abstract-cubist",
        title: "Abstract Cubist",
        prompt: "Transform this image in an abstract cubist style, reducing elements into geometric shapes, bold angles, and fragmented perspectives.",
    },
];

impl ArtStyle {
    /// Every style, in catalog order.
    pub const ALL: [ArtStyle; 8] = [
        Self::CyberpunkNeon,
        Self::VintageSepia,
        Self::WhimsicalWatercolor,
        Self::BoldPopArt,
        Self::SteampunkVictorian,
        Self::MinimalistFlat,
        Self::BaroquePainting,
        Self::AbstractCubist,
    ];

    /// Returns the kebab-case identifier.
    pub fn id(&self) -> &'static str {
        StyleCatalog::descriptor(*self).id
    }
}

impl std::fmt::Display for ArtStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for ArtStyle {
    type Err = SnapArtError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|style| style.id() == s)
            .ok_or_else(|| SnapArtError::InvalidRequest(format!("unknown art style: {s}")))
    }
}

/// Read-only registry of style descriptors.
pub struct StyleCatalog;

impl StyleCatalog {
    /// Returns the descriptor for `style`.
    pub fn descriptor(style: ArtStyle) -> &'static StyleDescriptor {
        &DESCRIPTORS[style as usize]
    }

    /// Returns the generation prompt for `style`.
    pub fn prompt_for(style: ArtStyle) -> &'static str {
        Self::descriptor(style).prompt
    }

    /// Returns the display title for `style`.
    pub fn title_for(style: ArtStyle) -> &'static str {
        Self::descriptor(style).title
    }

    /// Returns all descriptors in catalog order.
    pub fn all() -> &'static [StyleDescriptor] {
        &DESCRIPTORS
    }
}
