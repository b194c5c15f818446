//! Fixed vocabularies a generation request is built from.
//!
//! Each style and color scheme carries the descriptive phrase that is spliced
//! into the model prompt. The wire spelling is what the web client sends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

// -- Styles --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThumbnailStyle {
    #[serde(rename = "Bold & Graphic", alias = "Bold and Graphic")]
    BoldGraphic,
    #[serde(rename = "Tech/Futuristic")]
    TechFuturistic,
    Minimalist,
    Photorealistic,
    Illustrated,
}

impl ThumbnailStyle {
    pub const ALL: [ThumbnailStyle; 5] = [
        ThumbnailStyle::BoldGraphic,
        ThumbnailStyle::TechFuturistic,
        ThumbnailStyle::Minimalist,
        ThumbnailStyle::Photorealistic,
        ThumbnailStyle::Illustrated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThumbnailStyle::BoldGraphic => "Bold & Graphic",
            ThumbnailStyle::TechFuturistic => "Tech/Futuristic",
            ThumbnailStyle::Minimalist => "Minimalist",
            ThumbnailStyle::Photorealistic => "Photorealistic",
            ThumbnailStyle::Illustrated => "Illustrated",
        }
    }

    pub fn prompt_phrase(&self) -> &'static str {
        match self {
            ThumbnailStyle::BoldGraphic => {
                "eye-catching thumbnail, bold typography, vibrant colors, expressive facial reaction, dramatic lighting, high contrast, click-worthy composition, professional style"
            }
            ThumbnailStyle::TechFuturistic => {
                "futuristic thumbnail, sleek modern design, digital UI elements, glowing accents, holographic effects, cyber-tech aesthetic, sharp lighting, high-tech atmosphere"
            }
            ThumbnailStyle::Minimalist => {
                "minimalist thumbnail, clean layout, simple shapes, limited color palette, plenty of negative space, modern flat design, clear focal point"
            }
            ThumbnailStyle::Photorealistic => {
                "photorealistic thumbnail, ultra-realistic lighting, natural skin tones, candid moment, DSLR-style photography, lifestyle realism, shallow depth of field"
            }
            ThumbnailStyle::Illustrated => {
                "illustrated thumbnail, custom digital illustration, stylized characters, bold outlines, vibrant colors, creative cartoon or vector art style"
            }
        }
    }
}

impl FromStr for ThumbnailStyle {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bold & Graphic" | "Bold and Graphic" => Ok(ThumbnailStyle::BoldGraphic),
            "Tech/Futuristic" => Ok(ThumbnailStyle::TechFuturistic),
            "Minimalist" => Ok(ThumbnailStyle::Minimalist),
            "Photorealistic" => Ok(ThumbnailStyle::Photorealistic),
            "Illustrated" => Ok(ThumbnailStyle::Illustrated),
            other => Err(UnknownValue {
                kind: "style",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ThumbnailStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Color schemes --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Vibrant,
    Sunset,
    Forest,
    Neon,
    Purple,
    Monochrome,
    Ocean,
    Pastel,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 8] = [
        ColorScheme::Vibrant,
        ColorScheme::Sunset,
        ColorScheme::Forest,
        ColorScheme::Neon,
        ColorScheme::Purple,
        ColorScheme::Monochrome,
        ColorScheme::Ocean,
        ColorScheme::Pastel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScheme::Vibrant => "vibrant",
            ColorScheme::Sunset => "sunset",
            ColorScheme::Forest => "forest",
            ColorScheme::Neon => "neon",
            ColorScheme::Purple => "purple",
            ColorScheme::Monochrome => "monochrome",
            ColorScheme::Ocean => "ocean",
            ColorScheme::Pastel => "pastel",
        }
    }

    pub fn prompt_phrase(&self) -> &'static str {
        match self {
            ColorScheme::Vibrant => {
                "vibrant and energetic colors, high saturation, bold contrasts, eye-catching palette"
            }
            ColorScheme::Sunset => {
                "warm sunset tones, orange pink and purple hues, soft gradients, cinematic glow"
            }
            ColorScheme::Forest => {
                "natural green tones, earthy colors, calm and organic palette, fresh atmosphere"
            }
            ColorScheme::Neon => {
                "neon glow effects, electric blues and pinks, cyberpunk lighting, high contrast glow"
            }
            ColorScheme::Purple => {
                "purple-dominant color palette, magenta and violet tones, modern and stylish mood"
            }
            ColorScheme::Monochrome => {
                "black and white color scheme, high contrast, dramatic lighting, timeless aesthetic"
            }
            ColorScheme::Ocean => {
                "cool blue and teal tones, aquatic color palette, fresh and clean atmosphere"
            }
            ColorScheme::Pastel => {
                "soft pastel colors, low saturation, gentle tones, calm and friendly aesthetic"
            }
        }
    }
}

impl FromStr for ColorScheme {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorScheme::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownValue {
                kind: "color scheme",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Aspect ratios --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "16:9" => Ok(AspectRatio::Landscape),
            "1:1" => Ok(AspectRatio::Square),
            "9:16" => Ok(AspectRatio::Portrait),
            other => Err(UnknownValue {
                kind: "aspect ratio",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
