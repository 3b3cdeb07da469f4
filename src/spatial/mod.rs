//! Spatial data structures shared across the pipeline
//!
//! This module contains:
//! - Binary pixel masks
//! - Pixel-space extents and their union
//! - Sparse embark tile grids and terrain codes

/// Pixel-space bounding rectangles
pub mod extent;
/// Sparse embark tile grids
pub mod grid;
/// Packed binary pixel masks
pub mod mask;
/// Terrain classification codes
pub mod terrain;

pub use extent::{Extent, OverallExtent};
pub use grid::EmbarkGrid;
pub use mask::Mask;
pub use terrain::TileClass;
