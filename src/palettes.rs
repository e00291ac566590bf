//! Print-safe colour palettes, colour cycles and RGB/CMYK conversion.
//!
//! Every palette is muted, colour-blind friendly and reproduces in CMYK
//! without visible shifts. Named palettes keep their entry order, which is
//! also the order used when a palette feeds a colour cycle.

use std::fmt;
use std::str::FromStr;

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VizError};

/// 8-bit sRGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` literal.
    pub const fn from_u32(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as u8,
            g: ((rgb >> 8) & 0xFF) as u8,
            b: (rgb & 0xFF) as u8,
        }
    }

    /// Parse `#RRGGBB` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(VizError::InvalidColor(hex.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Self::from_u32)
            .map_err(|_| VizError::InvalidColor(hex.to_string()))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Channels as 0..1 floats.
    pub fn to_unit(self) -> (f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        )
    }

    /// CMYK (0..1) of this colour, see [`rgb_to_cmyk`].
    pub fn to_cmyk(self) -> (f64, f64, f64, f64) {
        let (r, g, b) = self.to_unit();
        rgb_to_cmyk(r, g, b)
    }

    pub fn to_plotters(self) -> RGBColor {
        RGBColor(self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Convert RGB (0..1) to CMYK (0..1). Pure black maps to `(0, 0, 0, 1)`.
pub fn rgb_to_cmyk(r: f64, g: f64, b: f64) -> (f64, f64, f64, f64) {
    if r == 0.0 && g == 0.0 && b == 0.0 {
        return (0.0, 0.0, 0.0, 1.0);
    }
    let k = 1.0 - r.max(g).max(b);
    if k >= 1.0 {
        return (0.0, 0.0, 0.0, k);
    }
    let c = (1.0 - r - k) / (1.0 - k);
    let m = (1.0 - g - k) / (1.0 - k);
    let y = (1.0 - b - k) / (1.0 - k);
    (c, m, y, k)
}

/// Convert CMYK (0..1) to RGB (0..1).
pub fn cmyk_to_rgb(c: f64, m: f64, y: f64, k: f64) -> (f64, f64, f64) {
    ((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
}

/// Ordered name → colour palette.
#[derive(Debug)]
pub struct NamedPalette {
    pub name: &'static str,
    pub entries: &'static [(&'static str, Rgb8)],
}

impl NamedPalette {
    pub fn get(&self, key: &str) -> Option<Rgb8> {
        self.entries
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, c)| *c)
    }

    pub fn colors(&self) -> Vec<Rgb8> {
        self.entries.iter().map(|(_, c)| *c).collect()
    }
}

/// Professional, clinical blues.
pub const CLINICAL_BLUE: NamedPalette = NamedPalette {
    name: "Clinical Blue",
    entries: &[
        ("Navy", Rgb8::from_u32(0x1F4788)),       // C100 M80 Y0 K30
        ("Steel Blue", Rgb8::from_u32(0x4A7BA7)), // C70 M40 Y0 K0
        ("Sky Blue", Rgb8::from_u32(0x7FA8C9)),   // C50 M20 Y0 K0
        ("Light Blue", Rgb8::from_u32(0xB8D4E8)), // C30 M5 Y0 K0
        ("Pale Blue", Rgb8::from_u32(0xE3F0F7)),  // C15 M0 Y0 K0
    ],
};

/// Natural skin and tissue tones for clinical photography.
pub const TISSUE_TONE: NamedPalette = NamedPalette {
    name: "Tissue Tone",
    entries: &[
        ("Deep", Rgb8::from_u32(0xC08060)),
        ("Medium", Rgb8::from_u32(0xD4A080)),
        ("Light", Rgb8::from_u32(0xE8C4A8)),
        ("Pale", Rgb8::from_u32(0xF5E0D0)),
        ("Fair", Rgb8::from_u32(0xFAF0E8)),
    ],
};

/// Graphs, charts and statistical data.
pub const CLINICAL_DATA: NamedPalette = NamedPalette {
    name: "Clinical Data",
    entries: &[
        ("Primary", Rgb8::from_u32(0x2C5F87)),
        ("Secondary", Rgb8::from_u32(0x7FA8C9)),
        ("Tertiary", Rgb8::from_u32(0xB89D6F)),
        ("Accent", Rgb8::from_u32(0x9B5D5D)),
        ("Neutral", Rgb8::from_u32(0x7A8A99)),
    ],
};

/// Before/after and control/treatment comparisons.
pub const COMPARISON: NamedPalette = NamedPalette {
    name: "Comparison",
    entries: &[
        ("Before", Rgb8::from_u32(0x8B7A7A)),
        ("After", Rgb8::from_u32(0x5B8F7D)),
        ("Control", Rgb8::from_u32(0x7A8A99)),
        ("Treatment", Rgb8::from_u32(0x9B7357)),
    ],
};

/// Significance levels.
pub const STATISTICAL: NamedPalette = NamedPalette {
    name: "Statistical",
    entries: &[
        ("Significant", Rgb8::from_u32(0x5B8F7D)),        // p < 0.05
        ("Highly Significant", Rgb8::from_u32(0x2C5F87)), // p < 0.01
        ("Non-Significant", Rgb8::from_u32(0xB8B8B8)),
        ("Trend", Rgb8::from_u32(0xD4A080)), // p < 0.1
    ],
};

/// High-contrast categorical palette.
pub const CATEGORICAL: [Rgb8; 7] = [
    Rgb8::from_u32(0x2C5F87), // blue
    Rgb8::from_u32(0xB89D6F), // tan
    Rgb8::from_u32(0x5B8F7D), // teal
    Rgb8::from_u32(0x9B7357), // brown
    Rgb8::from_u32(0x7A8A99), // gray-blue
    Rgb8::from_u32(0xC08060), // terracotta
    Rgb8::from_u32(0x4A7BA7), // steel blue
];

/// Lightest to darkest.
pub const SEQUENTIAL_BLUES: [Rgb8; 6] = [
    Rgb8::from_u32(0xE3F0F7),
    Rgb8::from_u32(0xB8D4E8),
    Rgb8::from_u32(0x7FA8C9),
    Rgb8::from_u32(0x4A7BA7),
    Rgb8::from_u32(0x2C5F87),
    Rgb8::from_u32(0x1F4788),
];

/// Warm gray (before) through neutral to teal (after).
pub const DIVERGING: [Rgb8; 5] = [
    Rgb8::from_u32(0x8B7A7A),
    Rgb8::from_u32(0xB8A898),
    Rgb8::from_u32(0xE0D8D0),
    Rgb8::from_u32(0xA8C4B8),
    Rgb8::from_u32(0x5B8F7D),
];

pub const NAMED_PALETTES: [&NamedPalette; 5] = [
    &CLINICAL_BLUE,
    &TISSUE_TONE,
    &CLINICAL_DATA,
    &COMPARISON,
    &STATISTICAL,
];

/// Light/dark variant pair with the CMYK percentages used for print proofs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorFamily {
    pub name: &'static str,
    pub light: Rgb8,
    pub dark: Rgb8,
    pub cmyk_light: (u8, u8, u8, u8),
    pub cmyk_dark: (u8, u8, u8, u8),
}

pub const COLOR_FAMILIES: [ColorFamily; 4] = [
    ColorFamily {
        name: "Clinical Blue",
        light: Rgb8::from_u32(0x7FA8C9),
        dark: Rgb8::from_u32(0x1F4788),
        cmyk_light: (50, 20, 0, 0),
        cmyk_dark: (100, 80, 0, 30),
    },
    ColorFamily {
        name: "Tissue Tone",
        light: Rgb8::from_u32(0xE8C4A8),
        dark: Rgb8::from_u32(0xC08060),
        cmyk_light: (0, 20, 30, 9),
        cmyk_dark: (0, 40, 60, 25),
    },
    ColorFamily {
        name: "Clinical Teal",
        light: Rgb8::from_u32(0x88C4B4),
        dark: Rgb8::from_u32(0x5B8F7D),
        cmyk_light: (40, 10, 30, 10),
        cmyk_dark: (60, 20, 50, 20),
    },
    ColorFamily {
        name: "Warm Neutral",
        light: Rgb8::from_u32(0xD4C4B8),
        dark: Rgb8::from_u32(0x9B7357),
        cmyk_light: (10, 20, 25, 15),
        cmyk_dark: (20, 40, 60, 30),
    },
];

/// Colour cycle used for successive series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColorCycle {
    /// Categorical palette.
    #[default]
    Default,
    /// Muted clinical data palette.
    Clinical,
    /// Before, After.
    Comparison,
}

impl ColorCycle {
    pub fn colors(self) -> Vec<Rgb8> {
        match self {
            ColorCycle::Default => CATEGORICAL.to_vec(),
            ColorCycle::Clinical => CLINICAL_DATA.colors(),
            ColorCycle::Comparison => vec![
                comparison_color("Before"),
                comparison_color("After"),
            ],
        }
    }

    /// Colour of the `idx`-th series; wraps around.
    pub fn color(self, idx: usize) -> Rgb8 {
        let colors = self.colors();
        colors[idx % colors.len()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorCycle::Default => "default",
            ColorCycle::Clinical => "clinical",
            ColorCycle::Comparison => "comparison",
        }
    }
}

impl FromStr for ColorCycle {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(ColorCycle::Default),
            "clinical" => Ok(ColorCycle::Clinical),
            "comparison" => Ok(ColorCycle::Comparison),
            other => Err(VizError::UnknownCycle(other.to_string())),
        }
    }
}

impl TryFrom<String> for ColorCycle {
    type Error = VizError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ColorCycle> for String {
    fn from(c: ColorCycle) -> Self {
        c.as_str().to_string()
    }
}

fn comparison_color(key: &str) -> Rgb8 {
    COMPARISON.get(key).unwrap_or(CATEGORICAL[0])
}

/// Default colour for a named comparison group (`Control`, `Treatment`,
/// `Before`, `After`); anything else gets the clinical primary.
pub fn group_color(group: &str) -> Rgb8 {
    COMPARISON
        .get(group)
        .unwrap_or_else(|| CLINICAL_DATA.entries[0].1)
}
