//! Resampling classified pixel regions onto the embark tile grid
//!
//! Screenshots rarely align pixel-for-pixel with tiles, so the region's
//! 0/1 classification values are interpolated with a bivariate spline over
//! the unit square, sampled at one point per tile, and snapped back to the
//! nearest classification level.

use ndarray::Array2;

use crate::io::configuration::TILES_PER_EMBARK_BLOCK;
use crate::io::error::{Result, invalid_parameter};
use crate::math::interpolation::SplineSurface;
use crate::spatial::extent::Extent;
use crate::spatial::grid::EmbarkGrid;
use crate::spatial::mask::Mask;
use crate::spatial::terrain::TileClass;

/// How source raster axes map onto grid axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisOrder {
    /// Source row becomes grid row
    #[default]
    RowMajor,
    /// Source row becomes grid column
    Transposed,
}

/// A discrete value the interpolated surface snaps to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    /// Sample value representing this class
    pub value: f64,
    /// Classification written for this level
    pub class: TileClass,
}

/// Maps pixel regions to square embark grids
#[derive(Debug, Clone)]
pub struct GridResampler {
    side: usize,
    levels: Vec<Level>,
    axis_order: AxisOrder,
}

impl GridResampler {
    /// Resampler with custom levels
    ///
    /// # Errors
    ///
    /// Returns an error if `side` is zero or no levels are given
    pub fn new(side: usize, levels: Vec<Level>) -> Result<Self> {
        if side == 0 {
            return Err(invalid_parameter(
                "side",
                &side,
                &"grid must have at least one tile per side",
            ));
        }
        if levels.is_empty() {
            return Err(invalid_parameter(
                "levels",
                &"[]",
                &"at least one classification level is required",
            ));
        }
        Ok(Self {
            side,
            levels,
            axis_order: AxisOrder::RowMajor,
        })
    }

    /// Binary underground resampler for an embark of `embark_size` blocks
    ///
    /// # Errors
    ///
    /// Returns an error if `embark_size` is zero
    pub fn binary(embark_size: usize) -> Result<Self> {
        Self::new(
            TILES_PER_EMBARK_BLOCK * embark_size,
            vec![
                Level {
                    value: 0.0,
                    class: TileClass::Open,
                },
                Level {
                    value: 1.0,
                    class: TileClass::UNDERGROUND,
                },
            ],
        )
    }

    /// Override the axis mapping
    #[must_use]
    pub const fn with_axis_order(mut self, axis_order: AxisOrder) -> Self {
        self.axis_order = axis_order;
        self
    }

    /// Tiles per grid side
    pub const fn side(&self) -> usize {
        self.side
    }

    /// Classification of the level closest to `value`
    fn nearest_level(&self, value: f64) -> TileClass {
        self.levels
            .iter()
            .min_by(|a, b| (a.value - value).abs().total_cmp(&(b.value - value).abs()))
            .map_or(TileClass::Open, |level| level.class)
    }

    /// Resample a raster of level values onto the grid
    ///
    /// Only non-open cells are stored. An empty raster yields an empty grid.
    ///
    /// # Errors
    ///
    /// Returns an error if spline construction fails
    pub fn resample(&self, region: &Array2<f64>) -> Result<EmbarkGrid> {
        let mut grid = EmbarkGrid::new(self.side, self.side);
        let (rows, cols) = region.dim();
        if rows == 0 || cols == 0 {
            return Ok(grid);
        }

        let sampled = SplineSurface::new(region.clone())?.sample_grid(self.side, self.side)?;
        for ((row, col), &value) in sampled.indexed_iter() {
            let class = self.nearest_level(value);
            if class.is_open() {
                continue;
            }
            let (grid_row, grid_col) = match self.axis_order {
                AxisOrder::RowMajor => (row, col),
                AxisOrder::Transposed => (col, row),
            };
            grid.set(grid_row, grid_col, class);
        }
        Ok(grid)
    }

    /// Resample the part of a mask inside `extent` (the whole mask if `None`)
    ///
    /// # Errors
    ///
    /// Returns an error if spline construction fails
    pub fn resample_mask(&self, mask: &Mask, extent: Option<&Extent>) -> Result<EmbarkGrid> {
        if mask.is_empty() {
            return Ok(EmbarkGrid::new(self.side, self.side));
        }
        let region = extent.map_or_else(|| mask.clone(), |extent| mask.crop(extent));
        self.resample(&region.to_levels())
    }
}
