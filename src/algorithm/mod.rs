/// Two-pass per-world pipeline and batch reports
pub mod assembler;
/// Corner detection, patch descriptors and matching
pub mod features;
/// Registration mark alignment and crop-to-embark
pub mod registration;
/// Spline resampling onto the tile grid
pub mod resample;
/// Screenshot stitching and panorama caching
pub mod stitching;
