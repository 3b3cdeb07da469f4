//! Pixel-level analysis of screenshot regions

/// Colour-band classification with small-blob suppression
pub mod classifier;
/// Connected-component labeling
pub mod components;
