//! Panorama composition from overlapping minimap screenshots
//!
//! Minimap captures share one rendering scale and orientation, so the affine
//! model between two overlapping screenshots reduces to an integer
//! translation. Offsets are estimated from matched corner features with
//! RANSAC, screenshots are placed greedily along the strongest overlaps, and
//! the union of all placements becomes the panorama canvas.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbImage;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::algorithm::features::{Feature, FeatureDetector, match_features};
use crate::io::configuration::{
    DEFAULT_SEED, IMAGE_EXTENSION, MIN_STITCH_INLIERS, RANSAC_INLIER_TOLERANCE, RANSAC_ITERATIONS,
};
use crate::io::error::{MapError, Result, WithContext};
use crate::io::image::{load_rgb, save_rgb};

/// Composes a set of overlapping screenshots into one image
pub trait Stitcher {
    /// Stitch screenshots of a single elevation
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Stitching`] when the screenshots cannot be connected
    fn stitch(&self, elevation: &str, screenshots: &[RgbImage]) -> Result<RgbImage>;
}

/// Robust translation estimation parameters
#[derive(Debug, Clone, Copy)]
pub struct RansacConfig {
    /// Hypotheses drawn when matches outnumber this
    pub iterations: usize,
    /// Per-axis tolerance for a match to count as inlier
    pub inlier_tolerance: f64,
    /// Inliers required to accept an overlap
    pub min_inliers: usize,
    /// Seed for hypothesis sampling
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            iterations: RANSAC_ITERATIONS,
            inlier_tolerance: RANSAC_INLIER_TOLERANCE,
            min_inliers: MIN_STITCH_INLIERS,
            seed: DEFAULT_SEED,
        }
    }
}

/// Translation of one screenshot relative to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    /// Horizontal shift in pixels
    pub dx: i64,
    /// Vertical shift in pixels
    pub dy: i64,
    /// Number of supporting feature matches
    pub inliers: usize,
}

/// Feature-based stitcher for same-scale screenshots
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureStitcher {
    /// Keypoint detection settings
    pub detector: FeatureDetector,
    /// Offset estimation settings
    pub ransac: RansacConfig,
}

impl FeatureStitcher {
    /// Stitcher with a specific sampling seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            ransac: RansacConfig {
                seed,
                ..RansacConfig::default()
            },
            ..Self::default()
        }
    }

    /// Where `moving`'s origin lies in `anchor`'s frame
    ///
    /// Returns `None` when fewer than `min_inliers` matches agree.
    pub fn estimate_offset(&self, anchor: &[Feature], moving: &[Feature]) -> Option<Offset> {
        let candidates: Vec<(f64, f64)> = match_features(moving, anchor)
            .iter()
            .filter_map(|m| {
                let a = anchor.get(m.train)?.keypoint;
                let b = moving.get(m.query)?.keypoint;
                Some((a.x as f64 - b.x as f64, a.y as f64 - b.y as f64))
            })
            .collect();

        if candidates.len() < self.ransac.min_inliers {
            return None;
        }

        let tolerance = self.ransac.inlier_tolerance;
        let supporters = |hypothesis: (f64, f64)| -> Vec<(f64, f64)> {
            candidates
                .iter()
                .copied()
                .filter(|&(dx, dy)| {
                    (dx - hypothesis.0).abs() <= tolerance && (dy - hypothesis.1).abs() <= tolerance
                })
                .collect()
        };

        let hypotheses: Vec<(f64, f64)> = if candidates.len() <= self.ransac.iterations {
            candidates.clone()
        } else {
            let mut rng = StdRng::seed_from_u64(self.ransac.seed);
            (0..self.ransac.iterations)
                .filter_map(|_| candidates.get(rng.random_range(0..candidates.len())).copied())
                .collect()
        };

        let mut best: Vec<(f64, f64)> = Vec::new();
        for hypothesis in hypotheses {
            let inliers = supporters(hypothesis);
            if inliers.len() > best.len() {
                best = inliers;
            }
        }

        if best.len() < self.ransac.min_inliers {
            return None;
        }

        let count = best.len() as f64;
        let (sum_x, sum_y) = best
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(dx, dy)| (sx + dx, sy + dy));
        Some(Offset {
            dx: (sum_x / count).round() as i64,
            dy: (sum_y / count).round() as i64,
            inliers: best.len(),
        })
    }
}

impl Stitcher for FeatureStitcher {
    fn stitch(&self, elevation: &str, screenshots: &[RgbImage]) -> Result<RgbImage> {
        let failure = |reason: String| MapError::Stitching {
            elevation: elevation.to_string(),
            reason,
        };

        match screenshots {
            [] => return Err(failure("no screenshots to stitch".to_string())),
            [only] => return Ok(only.clone()),
            _ => {}
        }

        let features: Vec<Vec<Feature>> = screenshots
            .iter()
            .map(|shot| self.detector.detect(shot))
            .collect();

        // Greedy spanning placement: repeatedly attach the unplaced screenshot
        // with the strongest overlap against any placed one
        let mut positions: Vec<Option<(i64, i64)>> = vec![None; screenshots.len()];
        positions[0] = Some((0, 0));
        let mut order = vec![0];
        let mut estimates: HashMap<(usize, usize), Option<Offset>> = HashMap::new();

        while order.len() < screenshots.len() {
            let mut best: Option<(usize, (i64, i64), usize)> = None;
            for &placed in &order {
                let Some((px, py)) = positions[placed] else {
                    continue;
                };
                for candidate in (0..screenshots.len()).filter(|&i| positions[i].is_none()) {
                    let offset = *estimates.entry((placed, candidate)).or_insert_with(|| {
                        self.estimate_offset(&features[placed], &features[candidate])
                    });
                    if let Some(offset) = offset
                        && best.is_none_or(|(_, _, inliers)| offset.inliers > inliers)
                    {
                        best = Some((candidate, (px + offset.dx, py + offset.dy), offset.inliers));
                    }
                }
            }

            let Some((index, position, inliers)) = best else {
                let unplaced = positions.iter().filter(|p| p.is_none()).count();
                return Err(failure(format!(
                    "{unplaced} of {} screenshots share too few features with the rest",
                    screenshots.len()
                )));
            };
            log::debug!("placed screenshot {index} at {position:?} ({inliers} inliers)");
            positions[index] = Some(position);
            order.push(index);
        }

        let placed: Vec<(i64, i64, &RgbImage)> = order
            .iter()
            .filter_map(|&i| {
                let (x, y) = positions[i]?;
                Some((x, y, &screenshots[i]))
            })
            .collect();

        let min_x = placed.iter().map(|p| p.0).min().unwrap_or(0);
        let min_y = placed.iter().map(|p| p.1).min().unwrap_or(0);
        let max_x = placed
            .iter()
            .map(|p| p.0 + i64::from(p.2.width()))
            .max()
            .unwrap_or(0);
        let max_y = placed
            .iter()
            .map(|p| p.1 + i64::from(p.2.height()))
            .max()
            .unwrap_or(0);

        let width = u32::try_from(max_x - min_x).map_err(|_| failure("panorama too wide".into()))?;
        let height =
            u32::try_from(max_y - min_y).map_err(|_| failure("panorama too tall".into()))?;

        // Earlier placements win where screenshots overlap
        let mut canvas = RgbImage::new(width, height);
        for &(x, y, shot) in placed.iter().rev() {
            image::imageops::replace(&mut canvas, shot, x - min_x, y - min_y);
        }
        Ok(canvas)
    }
}

/// Result of stitching one elevation with caching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchOutcome {
    /// Panorama file
    pub path: PathBuf,
    /// Whether an existing panorama was reused
    pub reused: bool,
}

/// Panorama file for an elevation directory: `<elevation_dir>.png`
pub fn panorama_path(elevation_dir: &Path) -> PathBuf {
    let mut name = elevation_dir.as_os_str().to_owned();
    name.push(".");
    name.push(IMAGE_EXTENSION);
    PathBuf::from(name)
}

/// Stitch an elevation's screenshots unless its panorama already exists
///
/// An existing panorama file is returned untouched without invoking the
/// stitcher; there is no staleness check, delete the file to force a rebuild.
///
/// # Errors
///
/// Returns an elevation-scoped error if a screenshot cannot be loaded,
/// stitching fails, or the panorama cannot be written
pub fn stitch_cached<S: Stitcher + ?Sized>(
    stitcher: &S,
    elevation: &str,
    elevation_dir: &Path,
    screenshots: &[PathBuf],
) -> Result<StitchOutcome> {
    let path = panorama_path(elevation_dir);
    if path.exists() {
        log::info!("Stitched file {} already exists", path.display());
        return Ok(StitchOutcome { path, reused: true });
    }

    log::info!(
        "Found {} screenshots in {}, stitching",
        screenshots.len(),
        elevation_dir.display()
    );
    let images = screenshots
        .iter()
        .map(|shot| load_rgb(shot))
        .collect::<Result<Vec<_>>>()?;

    let start = std::time::Instant::now();
    let panorama = stitcher.stitch(elevation, &images)?;
    log::info!(
        "Stitched {}x{} panorama in {:.1} seconds, saving to {}",
        panorama.width(),
        panorama.height(),
        start.elapsed().as_secs_f64(),
        path.display()
    );
    save_rgb(&panorama, &path).within_elevation(elevation)?;
    Ok(StitchOutcome {
        path,
        reused: false,
    })
}
