//! Numerical utilities for the extraction pipeline

/// Normalised cross-correlation template search
pub mod correlation;
/// Cubic spline interpolation in one and two dimensions
pub mod interpolation;
