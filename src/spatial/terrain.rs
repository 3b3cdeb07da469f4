//! Terrain classification codes shared by every grid producer

use std::fmt;

/// Classification of a single embark tile
///
/// `Open` is the default and is never stored in a sparse grid. Digits other
/// than zero carry the binary underground classification (and any further
/// numeric levels); the remaining variants follow the character-coded grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TileClass {
    /// Nothing detected
    #[default]
    Open,
    /// Numeric classification level 1 through 9
    Marked(u8),
    /// Not yet revealed
    Hidden,
    /// Soil
    Soil,
    /// Rock
    Rock,
    /// Tree
    Tree,
    /// Boulder
    Boulder,
    /// Water
    Water,
    /// Grass vegetation
    Grass,
    /// Other vegetation
    Plant,
    /// Mineral vein
    Mineral,
}

impl TileClass {
    /// The binary "underground" classification
    pub const UNDERGROUND: Self = Self::Marked(1);

    /// Decode a text grid glyph
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        Some(match glyph {
            ' ' | '0' => Self::Open,
            '1'..='9' => Self::Marked(glyph as u8 - b'0'),
            '?' => Self::Hidden,
            's' => Self::Soil,
            'r' => Self::Rock,
            'T' => Self::Tree,
            'B' => Self::Boulder,
            '~' => Self::Water,
            'g' => Self::Grass,
            'p' => Self::Plant,
            'M' => Self::Mineral,
            _ => return None,
        })
    }

    /// Encode as a text grid glyph
    pub const fn glyph(self) -> char {
        match self {
            Self::Open => '0',
            Self::Marked(level) => match level {
                0 | 1 => '1',
                2..=9 => (b'0' + level) as char,
                _ => '9',
            },
            Self::Hidden => '?',
            Self::Soil => 's',
            Self::Rock => 'r',
            Self::Tree => 'T',
            Self::Boulder => 'B',
            Self::Water => '~',
            Self::Grass => 'g',
            Self::Plant => 'p',
            Self::Mineral => 'M',
        }
    }

    /// Whether this is the implicit default value
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for TileClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}
