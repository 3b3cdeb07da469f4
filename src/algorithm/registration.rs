//! Registration mark alignment and crop-to-embark
//!
//! The registration mark is rendered at minimap scale and spans exactly two
//! tiles horizontally, so its matched bounding box gives both the embark's
//! pixel origin and the pixel size of one tile. Correlation search always
//! yields a best candidate; plausibility checks turn weak or mis-scaled
//! matches into elevation-level errors instead of silently cropping the
//! wrong region.

use std::path::Path;

use image::RgbImage;
use num_traits::ToPrimitive;

use crate::io::configuration::{
    DEFAULT_MIN_MATCH_SCORE, DEFAULT_SCALE_TOLERANCE, MARKER_TILE_SPAN, TILES_PER_EMBARK_BLOCK,
};
use crate::io::error::{MapError, Result, invalid_parameter};
use crate::io::image::load_rgb;
use crate::math::correlation::match_template;

/// Located registration mark
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Registration {
    /// `(x, y)` of the mark's top-left pixel
    pub top_left: (u32, u32),
    /// `(x, y)` one past the mark's bottom-right pixel
    pub bottom_right: (u32, u32),
    /// Correlation score of the match
    pub score: f64,
}

impl Registration {
    /// Width of the matched mark in pixels
    pub const fn width(&self) -> u32 {
        self.bottom_right.0 - self.top_left.0
    }

    /// Height of the matched mark in pixels
    pub const fn height(&self) -> u32 {
        self.bottom_right.1 - self.top_left.1
    }

    /// Pixels per tile implied by the mark
    pub fn tile_scale(&self) -> f64 {
        f64::from(self.width()) / f64::from(MARKER_TILE_SPAN)
    }

    /// Whole pixels per tile, as used for cropping
    pub const fn tile_size(&self) -> u32 {
        self.width() / MARKER_TILE_SPAN
    }

    /// Embark crop rectangle `(x, y, width, height)` inside an image
    ///
    /// The crop starts at the mark's top-left and spans
    /// `tile_size * 48 * embark_size` pixels per side, clamped to the image.
    pub fn embark_crop(&self, embark_size: usize, image_width: u32, image_height: u32) -> CropRegion {
        let tiles = (TILES_PER_EMBARK_BLOCK * embark_size)
            .to_u32()
            .unwrap_or(u32::MAX);
        let requested = self.tile_size().saturating_mul(tiles);
        let (x, y) = self.top_left;
        let width = requested.min(image_width.saturating_sub(x));
        let height = requested.min(image_height.saturating_sub(y));
        CropRegion {
            x,
            y,
            width,
            height,
            requested,
        }
    }
}

/// Pixel rectangle selected for one embark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    /// Left column
    pub x: u32,
    /// Top row
    pub y: u32,
    /// Width after clamping to the image
    pub width: u32,
    /// Height after clamping to the image
    pub height: u32,
    /// Side length before clamping
    pub requested: u32,
}

impl CropRegion {
    /// Whether the image was too small for the full embark
    pub const fn is_clamped(&self) -> bool {
        self.width < self.requested || self.height < self.requested
    }

    /// Copy the region out of an image
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        image::imageops::crop_imm(image, self.x, self.y, self.width, self.height).to_image()
    }
}

/// Limits that separate a real match from a best-effort guess
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plausibility {
    /// Expected pixels per tile; scale is unchecked when `None`
    pub expected_tile_px: Option<f64>,
    /// Allowed relative deviation from `expected_tile_px`
    pub tolerance: f64,
    /// Minimum correlation score; unchecked when `None`
    pub min_score: Option<f64>,
}

impl Default for Plausibility {
    fn default() -> Self {
        Self {
            expected_tile_px: None,
            tolerance: DEFAULT_SCALE_TOLERANCE,
            min_score: Some(DEFAULT_MIN_MATCH_SCORE),
        }
    }
}

impl Plausibility {
    /// Whether the tile scale is checked at all
    pub const fn checks_scale(&self) -> bool {
        self.expected_tile_px.is_some()
    }

    /// Check a registration, describing the first violated limit
    ///
    /// # Errors
    ///
    /// Returns [`MapError::AlignmentImplausible`] when the score is too low
    /// or the tile scale deviates beyond tolerance
    pub fn check(&self, elevation: &str, registration: &Registration) -> Result<()> {
        if let Some(min_score) = self.min_score
            && registration.score < min_score
        {
            return Err(MapError::AlignmentImplausible {
                elevation: elevation.to_string(),
                reason: format!(
                    "match score {:.3} below minimum {min_score:.3}",
                    registration.score
                ),
            });
        }

        if let Some(expected) = self.expected_tile_px {
            let scale = registration.tile_scale();
            let deviation = (scale - expected).abs() / expected;
            if deviation > self.tolerance {
                return Err(MapError::AlignmentImplausible {
                    elevation: elevation.to_string(),
                    reason: format!(
                        "tile scale {scale:.2}px deviates {:.0}% from expected {expected:.2}px (tolerance {:.0}%)",
                        deviation * 100.0,
                        self.tolerance * 100.0
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Finds the registration mark inside stitched panoramas
#[derive(Debug, Clone)]
pub struct RegistrationAligner {
    marker: RgbImage,
    plausibility: Plausibility,
}

impl RegistrationAligner {
    /// Aligner for an in-memory marker image
    ///
    /// # Errors
    ///
    /// Returns an error if the marker is narrower than the tile span
    pub fn new(marker: RgbImage) -> Result<Self> {
        if marker.width() < MARKER_TILE_SPAN || marker.height() == 0 {
            return Err(invalid_parameter(
                "marker",
                &format!("{}x{}", marker.width(), marker.height()),
                &format!("marker must be at least {MARKER_TILE_SPAN} pixels wide"),
            ));
        }
        Ok(Self {
            marker,
            plausibility: Plausibility::default(),
        })
    }

    /// Aligner for a marker image on disk
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be loaded or is too small
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::new(load_rgb(path)?)
    }

    /// Replace the plausibility limits
    #[must_use]
    pub const fn with_plausibility(mut self, plausibility: Plausibility) -> Self {
        self.plausibility = plausibility;
        self
    }

    /// Current plausibility limits
    pub const fn plausibility(&self) -> &Plausibility {
        &self.plausibility
    }

    /// Best-correlating marker position, without plausibility checks
    ///
    /// # Errors
    ///
    /// Returns an error if the marker does not fit inside the panorama
    pub fn locate(&self, panorama: &RgbImage) -> Result<Registration> {
        let found = match_template(panorama, &self.marker)?;
        Ok(Registration {
            top_left: (found.x, found.y),
            bottom_right: (found.x + self.marker.width(), found.y + self.marker.height()),
            score: found.score,
        })
    }

    /// Locate the marker and reject implausible matches
    ///
    /// # Errors
    ///
    /// Returns an error if the marker does not fit or the match fails the
    /// plausibility limits
    pub fn align(&self, elevation: &str, panorama: &RgbImage) -> Result<Registration> {
        let registration = self.locate(panorama)?;
        log::info!(
            "Found registration mark from {:?} to {:?} ({} x {}, score {:.3})",
            registration.top_left,
            registration.bottom_right,
            registration.width(),
            registration.height(),
            registration.score
        );
        self.plausibility.check(elevation, &registration)?;
        Ok(registration)
    }
}
