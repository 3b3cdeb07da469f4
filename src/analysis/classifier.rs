//! Colour-band pixel classification with small-blob suppression

use image::{Rgb, RgbImage};

use crate::analysis::components::{Connectivity, remove_small_regions};
use crate::io::configuration::{DEFAULT_MIN_REGION_AREA, UNDERGROUND_LOWER, UNDERGROUND_UPPER};
use crate::spatial::mask::Mask;

/// Inclusive per-channel RGB bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRange {
    /// Lowest accepted value per channel
    pub lower: [u8; 3],
    /// Highest accepted value per channel
    pub upper: [u8; 3],
}

impl ColorRange {
    /// Create a range, normalising swapped channel bounds
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        let mut lo = lower;
        let mut hi = upper;
        for (l, h) in lo.iter_mut().zip(hi.iter_mut()) {
            if *l > *h {
                std::mem::swap(l, h);
            }
        }
        Self {
            lower: lo,
            upper: hi,
        }
    }

    /// The dark grey band the minimap uses for underground tiles
    pub const fn underground() -> Self {
        Self {
            lower: UNDERGROUND_LOWER,
            upper: UNDERGROUND_UPPER,
        }
    }

    /// Whether a pixel falls inside the band
    pub fn contains(&self, pixel: &Rgb<u8>) -> bool {
        pixel
            .0
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(v, (lo, hi))| (*lo..=*hi).contains(v))
    }
}

impl Default for ColorRange {
    fn default() -> Self {
        Self::underground()
    }
}

/// Turns a screenshot region into a cleaned occupancy mask
///
/// A pixel is kept when its colour lies inside the band and it belongs to a
/// connected region of at least `min_area` pixels. Terrain renders as
/// contiguous blocks, so anything smaller is anti-aliasing noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileClassifier {
    range: ColorRange,
    min_area: usize,
    connectivity: Connectivity,
}

impl Default for TileClassifier {
    fn default() -> Self {
        Self::new(ColorRange::underground())
    }
}

impl TileClassifier {
    /// Classifier for a colour band with default area filtering
    pub const fn new(range: ColorRange) -> Self {
        Self {
            range,
            min_area: DEFAULT_MIN_REGION_AREA,
            connectivity: Connectivity::Eight,
        }
    }

    /// Override the minimum region area
    #[must_use]
    pub const fn with_min_area(mut self, min_area: usize) -> Self {
        self.min_area = min_area;
        self
    }

    /// Override the pixel adjacency used for region grouping
    #[must_use]
    pub const fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Target colour band
    pub const fn range(&self) -> ColorRange {
        self.range
    }

    /// Minimum region area in pixels
    pub const fn min_area(&self) -> usize {
        self.min_area
    }

    /// Pixel adjacency used for region grouping
    pub const fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Colour-band membership only, without region filtering
    pub fn raw_mask(&self, image: &RgbImage) -> Mask {
        let mut mask = Mask::new(image.height() as usize, image.width() as usize);
        for (x, y, pixel) in image.enumerate_pixels() {
            if self.range.contains(pixel) {
                mask.set(y as usize, x as usize, true);
            }
        }
        mask
    }

    /// Colour-band membership with regions below `min_area` removed
    ///
    /// An image with no pixels in the band yields an all-unset mask.
    pub fn classify(&self, image: &RgbImage) -> Mask {
        let raw = self.raw_mask(image);
        let cleaned = remove_small_regions(&raw, self.min_area, self.connectivity);
        log::debug!(
            "classified {} of {} pixels ({} before area filter)",
            cleaned.count(),
            raw.height() * raw.width(),
            raw.count()
        );
        cleaned
    }
}
