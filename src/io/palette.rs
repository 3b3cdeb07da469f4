//! Classification-to-colour mapping shared by every export policy

use std::collections::BTreeMap;

use clap::ValueEnum;

use crate::io::error::MapError;
use crate::spatial::terrain::TileClass;

/// Built-in colour policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PalettePolicy {
    /// Open versus everything else
    #[default]
    Binary,
    /// Every terrain glyph
    Terrain,
}

const WHITE: [u8; 3] = [0xFE, 0xFE, 0xFE];
const BLACK: [u8; 3] = [0x01, 0x01, 0x01];
const LIGHT_BROWN: [u8; 3] = [0xC4, 0xA4, 0x84];
const DARK_BROWN: [u8; 3] = [0x5C, 0x40, 0x33];
const LIGHT_GREY: [u8; 3] = [0xD3, 0xD3, 0xD3];
const DARK_GREY: [u8; 3] = [0x5A, 0x5A, 0x5A];
const BLUE: [u8; 3] = [0x00, 0x00, 0xFF];
const GRASS_GREEN: [u8; 3] = [0x4C, 0x9A, 0x2A];
const PLANT_GREEN: [u8; 3] = [0x2E, 0x5E, 0x1E];
const GOLD: [u8; 3] = [0xD4, 0xAF, 0x37];

/// Colour assigned to each classification
///
/// Numeric levels without their own entry fall back to the colour of
/// `Marked(1)`. Any other class without an entry takes the fallback colour,
/// if one is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: BTreeMap<TileClass, [u8; 3]>,
    fallback: Option<[u8; 3]>,
}

impl Palette {
    /// Palette with only the open colour defined and no fallback
    pub fn new(open: [u8; 3]) -> Self {
        let mut colors = BTreeMap::new();
        colors.insert(TileClass::Open, open);
        Self {
            colors,
            fallback: None,
        }
    }

    /// Build one of the built-in palettes
    pub fn from_policy(policy: PalettePolicy) -> Self {
        match policy {
            PalettePolicy::Binary => Self::binary(),
            PalettePolicy::Terrain => Self::terrain(),
        }
    }

    /// White open tiles; every other class is black
    pub fn binary() -> Self {
        Self::new(WHITE)
            .with(TileClass::UNDERGROUND, BLACK)
            .with_fallback(BLACK)
    }

    /// Full terrain colouring
    pub fn terrain() -> Self {
        Self::binary()
            .with(TileClass::Hidden, BLACK)
            .with(TileClass::Soil, DARK_BROWN)
            .with(TileClass::Rock, DARK_GREY)
            .with(TileClass::Tree, LIGHT_BROWN)
            .with(TileClass::Boulder, LIGHT_GREY)
            .with(TileClass::Water, BLUE)
            .with(TileClass::Grass, GRASS_GREEN)
            .with(TileClass::Plant, PLANT_GREEN)
            .with(TileClass::Mineral, GOLD)
    }

    /// Add or replace one colour
    #[must_use]
    pub fn with(mut self, class: TileClass, color: [u8; 3]) -> Self {
        self.colors.insert(class, color);
        self
    }

    /// Colour for every non-open class without an entry of its own
    #[must_use]
    pub const fn with_fallback(mut self, color: [u8; 3]) -> Self {
        self.fallback = Some(color);
        self
    }

    /// Colour of a class, if the palette covers it
    pub fn color(&self, class: TileClass) -> Option<[u8; 3]> {
        self.colors
            .get(&class)
            .copied()
            .or_else(|| match class {
                TileClass::Marked(_) => self.colors.get(&TileClass::UNDERGROUND).copied(),
                _ => None,
            })
            .or_else(|| self.fallback.filter(|_| !class.is_open()))
    }

    /// Colour of open tiles
    pub fn open_color(&self) -> [u8; 3] {
        self.colors.get(&TileClass::Open).copied().unwrap_or(WHITE)
    }

    /// Error describing a class with no colour
    pub fn missing_color(&self, class: TileClass) -> MapError {
        MapError::MissingColor {
            class,
            entries: self.colors.len(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::binary()
    }
}
