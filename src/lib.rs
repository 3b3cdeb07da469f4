//! Extraction of per-elevation embark grids from Dwarf Fortress minimap screenshots
//!
//! Each elevation's screenshots are stitched into a panorama, aligned against
//! a registration mark, cropped to the embark, classified pixel by pixel and
//! resampled onto a tile grid sized `48 × embark_size` per side. Pre-classified
//! text grids can be fed through the same export path.

#![forbid(unsafe_code)]

/// Stitching, alignment, resampling and per-world orchestration
pub mod algorithm;
/// Pixel classification and connected regions
pub mod analysis;
/// Input/output operations and error handling
pub mod io;
/// Correlation search and spline interpolation
pub mod math;
/// Masks, extents, terrain codes and tile grids
pub mod spatial;

pub use io::error::{MapError, Result};
