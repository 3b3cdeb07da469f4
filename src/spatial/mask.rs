//! Binary pixel masks backed by a packed bit vector

use bitvec::prelude::*;
use ndarray::Array2;
use std::fmt;

use crate::spatial::extent::Extent;

/// Row-major binary raster with the dimensions of its source image
///
/// Coordinates are `(row, col)`; out-of-range reads return `false` and
/// out-of-range writes are ignored.
#[derive(Clone, PartialEq, Eq)]
pub struct Mask {
    bits: BitVec,
    height: usize,
    width: usize,
}

impl Mask {
    /// Create a mask with every pixel unset
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            bits: bitvec![0; height * width],
            height,
            width,
        }
    }

    /// Create a mask with every pixel set
    pub fn filled(height: usize, width: usize) -> Self {
        Self {
            bits: bitvec![1; height * width],
            height,
            width,
        }
    }

    /// Build a mask by evaluating a predicate at every pixel
    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut mask = Self::new(height, width);
        for row in 0..height {
            for col in 0..width {
                if f(row, col) {
                    mask.set(row, col, true);
                }
            }
        }
        mask
    }

    /// Number of rows
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of columns
    pub const fn width(&self) -> usize {
        self.width
    }

    const fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.height && col < self.width {
            Some(row * self.width + col)
        } else {
            None
        }
    }

    /// Read one pixel
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.index(row, col)
            .and_then(|i| self.bits.get(i).as_deref().copied())
            .unwrap_or(false)
    }

    /// Write one pixel
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        if let Some(i) = self.index(row, col) {
            self.bits.set(i, value);
        }
    }

    /// Number of set pixels
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// True when no pixel is set
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Iterate over set pixels in row-major order
    pub fn iter_set(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width.max(1);
        self.bits.iter_ones().map(move |i| (i / width, i % width))
    }

    /// Convert to 0/1 sample values for interpolation
    pub fn to_levels(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.height, self.width), |(row, col)| {
            if self.get(row, col) { 1.0 } else { 0.0 }
        })
    }

    /// Copy the pixels inside `extent`, clamped to the mask bounds
    pub fn crop(&self, extent: &Extent) -> Self {
        let Some(region) = extent.clamp_to(self.height, self.width) else {
            return Self::new(0, 0);
        };
        Self::from_fn(region.height(), region.width(), |row, col| {
            self.get(region.top + row, region.left + col)
        })
    }

    /// Grow set regions by a square structuring element of the given radius
    #[must_use]
    pub fn dilate(&self, radius: usize) -> Self {
        self.sweep(radius, |count, _window| count > 0, false)
    }

    /// Shrink set regions by a square structuring element of the given radius
    ///
    /// Pixels beyond the border count as set, so regions touching the edge
    /// are not eroded from outside.
    #[must_use]
    pub fn erode(&self, radius: usize) -> Self {
        self.sweep(radius, |count, window| count == window, true)
    }

    /// Morphological closing: `iterations` dilations followed by as many erosions
    #[must_use]
    pub fn close(&self, radius: usize, iterations: usize) -> Self {
        let mut result = self.clone();
        for _ in 0..iterations {
            result = result.dilate(radius);
        }
        for _ in 0..iterations {
            result = result.erode(radius);
        }
        result
    }

    // Separable square filter: horizontal then vertical pass over window counts
    fn sweep(&self, radius: usize, keep: impl Fn(usize, usize) -> bool, border: bool) -> Self {
        let window = 2 * radius + 1;
        let horizontal = Self::from_fn(self.height, self.width, |row, col| {
            let count = (col as isize - radius as isize..=(col + radius) as isize)
                .filter(|&c| {
                    usize::try_from(c)
                        .ok()
                        .filter(|&c| c < self.width)
                        .map_or(border, |c| self.get(row, c))
                })
                .count();
            keep(count, window)
        });
        Self::from_fn(self.height, self.width, |row, col| {
            let count = (row as isize - radius as isize..=(row + radius) as isize)
                .filter(|&r| {
                    usize::try_from(r)
                        .ok()
                        .filter(|&r| r < self.height)
                        .map_or(border, |r| horizontal.get(r, col))
                })
                .count();
            keep(count, window)
        })
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mask({}x{}, {} set)",
            self.height,
            self.width,
            self.count()
        )
    }
}
