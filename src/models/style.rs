use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Illustration styles offered to callers.
///
/// Unknown style names resolve to [`Style::DEFAULT`] rather than failing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Style {
    Cartoon,
    Realistic,
    Watercolor,
    Sketch,
    Minimalist,
    PixelArt,
    Flashcard,
}

impl Style {
    pub const DEFAULT: Style = Style::Cartoon;

    pub fn descriptor(self) -> &'static str {
        match self {
            Style::Cartoon => "a friendly, colorful cartoon illustration with bold outlines",
            Style::Realistic => "a photorealistic image with natural lighting and fine detail",
            Style::Watercolor => "a soft watercolor painting with gentle color washes",
            Style::Sketch => "a clean pencil sketch with light shading",
            Style::Minimalist => "a minimalist flat vector illustration with simple shapes",
            Style::PixelArt => "a crisp 16-bit pixel art sprite",
            Style::Flashcard => {
                "a simple educational flashcard illustration, clear and easy to recognize"
            }
        }
    }

    /// Resolve a caller-supplied name, accepting `-` or spaces for `_`.
    pub fn resolve(name: Option<&str>) -> Style {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Style::DEFAULT;
        };
        let normalized = name.replace(['-', ' '], "_");
        Style::from_str(&normalized).unwrap_or_else(|_| {
            tracing::warn!(style = %name, fallback = %Style::DEFAULT, "Unknown style, using default");
            Style::DEFAULT
        })
    }

    pub fn names() -> Vec<String> {
        Style::iter().map(|s| s.to_string()).collect()
    }
}

impl Default for Style {
    fn default() -> Self {
        Style::DEFAULT
    }
}
