//! Sparse per-elevation tile grids
//!
//! Only non-open cells are stored; every absent cell reads back as
//! [`TileClass::Open`]. Coordinates are `(row, col)` with the origin at the
//! top-left corner of the embark.

use std::collections::BTreeMap;

use crate::io::configuration::TILES_PER_EMBARK_BLOCK;
use crate::spatial::terrain::TileClass;

/// Tile classification of one elevation of an embark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbarkGrid {
    rows: usize,
    cols: usize,
    cells: BTreeMap<(usize, usize), TileClass>,
}

impl EmbarkGrid {
    /// Create an empty grid
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: BTreeMap::new(),
        }
    }

    /// Empty square grid for an embark of `embark_size` blocks per side
    pub const fn for_embark(embark_size: usize) -> Self {
        let side = TILES_PER_EMBARK_BLOCK * embark_size;
        Self::new(side, side)
    }

    /// Number of rows
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Store a classification, returning `false` if the cell is out of bounds
    ///
    /// Writing [`TileClass::Open`] clears the cell.
    pub fn set(&mut self, row: usize, col: usize, class: TileClass) -> bool {
        if row >= self.rows || col >= self.cols {
            return false;
        }
        if class.is_open() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), class);
        }
        true
    }

    /// Classification of a cell; open when unset or out of bounds
    pub fn get(&self, row: usize, col: usize) -> TileClass {
        self.cells.get(&(row, col)).copied().unwrap_or_default()
    }

    /// Number of populated (non-open) cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when every cell is open
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Populated cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), TileClass)> + '_ {
        self.cells.iter().map(|(&position, &class)| (position, class))
    }

    /// Dense rows of classifications, open cells included
    pub fn to_rows(&self) -> Vec<Vec<TileClass>> {
        let mut rows = vec![vec![TileClass::Open; self.cols]; self.rows];
        for ((row, col), class) in self.iter() {
            if let Some(cell) = rows.get_mut(row).and_then(|r| r.get_mut(col)) {
                *cell = class;
            }
        }
        rows
    }
}
