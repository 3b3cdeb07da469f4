//! Pixel-space bounding rectangles and their order-independent union

use crate::analysis::components::{Connectivity, label_components};
use crate::spatial::mask::Mask;

/// Rectangle in source pixel coordinates
///
/// `left`/`top` are inclusive and `right`/`bottom` exclusive, so a single
/// pixel at `(row, col)` has extent `(col, row, col + 1, row + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent {
    /// First column
    pub left: usize,
    /// First row
    pub top: usize,
    /// One past the last column
    pub right: usize,
    /// One past the last row
    pub bottom: usize,
}

impl Extent {
    /// Create an extent, swapping bounds given in the wrong order
    pub const fn new(left: usize, top: usize, right: usize, bottom: usize) -> Self {
        let (left, right) = if left <= right {
            (left, right)
        } else {
            (right, left)
        };
        let (top, bottom) = if top <= bottom {
            (top, bottom)
        } else {
            (bottom, top)
        };
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Extent covering exactly one pixel
    pub const fn pixel(row: usize, col: usize) -> Self {
        Self::new(col, row, col + 1, row + 1)
    }

    /// Number of columns covered
    pub const fn width(&self) -> usize {
        self.right - self.left
    }

    /// Number of rows covered
    pub const fn height(&self) -> usize {
        self.bottom - self.top
    }

    /// Whether a pixel lies inside
    pub const fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.top && row < self.bottom && col >= self.left && col < self.right
    }

    /// Smallest extent covering both
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Restrict to a raster of the given size, `None` if nothing remains
    pub fn clamp_to(&self, height: usize, width: usize) -> Option<Self> {
        let clamped = Self {
            left: self.left.min(width),
            top: self.top.min(height),
            right: self.right.min(width),
            bottom: self.bottom.min(height),
        };
        (clamped.width() > 0 && clamped.height() > 0).then_some(clamped)
    }
}

/// Union of the bounding boxes of every connected region in `mask`
///
/// Returns `None` when the mask has no set pixels; an elevation without
/// detectable terrain is valid input.
pub fn find_extent(mask: &Mask, connectivity: Connectivity) -> Option<Extent> {
    let (_, components) = label_components(mask, connectivity);
    components
        .iter()
        .map(|component| component.bounds)
        .reduce(Extent::union)
}

/// Running union of per-elevation extents for one world
///
/// Folding is associative and commutative, so the result does not depend
/// on the order elevations are processed in, and partial folds can be merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverallExtent {
    extent: Option<Extent>,
    contributions: usize,
}

impl OverallExtent {
    /// Fold one elevation's extent in
    pub fn include(&mut self, extent: Option<Extent>) {
        self.contributions += 1;
        self.extent = union_of(self.extent, extent);
    }

    /// Combine two partial folds
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            extent: union_of(self.extent, other.extent),
            contributions: self.contributions + other.contributions,
        }
    }

    /// The accumulated extent, `None` if no elevation contained terrain
    pub const fn extent(&self) -> Option<Extent> {
        self.extent
    }

    /// Number of elevations folded in
    pub const fn contributions(&self) -> usize {
        self.contributions
    }
}

fn union_of(a: Option<Extent>, b: Option<Extent>) -> Option<Extent> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, b) => a.or(b),
    }
}

impl Extend<Option<Extent>> for OverallExtent {
    fn extend<I: IntoIterator<Item = Option<Extent>>>(&mut self, iter: I) {
        for extent in iter {
            self.include(extent);
        }
    }
}

impl FromIterator<Option<Extent>> for OverallExtent {
    fn from_iter<I: IntoIterator<Item = Option<Extent>>>(iter: I) -> Self {
        let mut overall = Self::default();
        overall.extend(iter);
        overall
    }
}
