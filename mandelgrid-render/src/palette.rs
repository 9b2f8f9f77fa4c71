use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PALETTE_SIZE: u32 = 256;
pub const MIN_PALETTE_SIZE: u32 = 2;
pub const MAX_PALETTE_SIZE: u32 = 32768;
/// Phase offsets are limited to one full turn either way.
pub const MAX_PHASE_DEGREES: f64 = 360.0;

/// Multiplier applied to even entries when alternate shading is on.
const SHADE_FACTOR: f64 = 0.93;
/// The muted curve is compressed into `[0.35, 0.65]` of full intensity.
const MUTED_SCALE: f64 = 0.3;
const MUTED_BASE: f64 = 0.35;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Which of the two generated sequences to paint with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaletteVariant {
    #[default]
    Standard,
    /// Desaturated tones, independent of the phase offset.
    Alt,
}

/// Parameters the palette is generated from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaletteSettings {
    pub size: u32,
    pub offset_degrees: f64,
    /// Darken every even entry so adjacent bands stay distinguishable.
    pub alternate_shade: bool,
}

impl PaletteSettings {
    /// Settings with alternate shading on for even sizes.
    pub fn new(size: u32, offset_degrees: f64) -> Self {
        Self {
            size,
            offset_degrees,
            alternate_shade: size % 2 == 0,
        }
    }

    /// Clamp into the supported ranges, substituting defaults for a zero
    /// size or a non-finite offset.
    pub fn normalized(self) -> Self {
        let size = if self.size == 0 {
            DEFAULT_PALETTE_SIZE
        } else {
            self.size.clamp(MIN_PALETTE_SIZE, MAX_PALETTE_SIZE)
        };
        let offset_degrees = if self.offset_degrees.is_finite() {
            self.offset_degrees.clamp(-MAX_PHASE_DEGREES, MAX_PHASE_DEGREES)
        } else {
            0.0
        };
        Self {
            size,
            offset_degrees,
            alternate_shade: self.alternate_shade,
        }
    }
}

impl Default for PaletteSettings {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE_SIZE, 0.0)
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Two cyclic color sequences of equal length generated from cosine hue
/// curves: `standard` and a muted `alt`.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    settings: PaletteSettings,
    standard: Vec<[u8; 3]>,
    alt: Vec<[u8; 3]>,
}

impl Palette {
    /// Generate both sequences. A pure function of its arguments.
    pub fn generate(size: u32, offset_degrees: f64, alternate_shade: bool) -> Self {
        Self::from_settings(PaletteSettings {
            size,
            offset_degrees,
            alternate_shade,
        })
    }

    pub fn from_settings(settings: PaletteSettings) -> Self {
        let settings = settings.normalized();
        let size = settings.size as usize;
        let offset = settings.offset_degrees * PI / 180.0;

        let mut standard = Vec::with_capacity(size);
        let mut alt = Vec::with_capacity(size);
        for i in 0..size {
            let theta = i as f64 * 2.0 * PI / size as f64;
            let mut color = [
                channel(theta + offset + 2.0),
                channel(theta + offset + 1.0),
                channel(theta + offset),
            ];
            if settings.alternate_shade && i % 2 == 0 {
                color = color.map(|v| (v as f64 * SHADE_FACTOR).round() as u8);
            }
            standard.push(color);
            alt.push([
                muted_channel(theta + 2.0),
                muted_channel(theta + 1.0),
                muted_channel(theta),
            ]);
        }

        Self {
            settings,
            standard,
            alt,
        }
    }

    /// The (normalized) settings this palette was generated from.
    pub fn settings(&self) -> &PaletteSettings {
        &self.settings
    }

    pub fn colors(&self, variant: PaletteVariant) -> &[[u8; 3]] {
        match variant {
            PaletteVariant::Standard => &self.standard,
            PaletteVariant::Alt => &self.alt,
        }
    }

    pub fn len(&self) -> usize {
        self.standard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.standard.is_empty()
    }

    /// Evenly spaced RGBA samples across one cycle (for a UI palette bar).
    pub fn preview_colors(&self, variant: PaletteVariant, count: usize) -> Vec<[u8; 4]> {
        let colors = self.colors(variant);
        (0..count)
            .map(|i| {
                let [r, g, b] = colors[i * colors.len() / count.max(1)];
                [r, g, b, 255]
            })
            .collect()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_settings(PaletteSettings::default())
    }
}

/// Map `cos θ` from `[-1, 1]` onto a channel value `0..=255`.
fn channel(theta: f64) -> u8 {
    scale_unit((theta.cos() + 1.0) / 2.0)
}

fn muted_channel(theta: f64) -> u8 {
    scale_unit((theta.cos() + 1.0) / 2.0 * MUTED_SCALE + MUTED_BASE)
}

fn scale_unit(val: f64) -> u8 {
    (val * 256.0).floor().clamp(0.0, 255.0) as u8
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
