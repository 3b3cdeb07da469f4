//! Per-world orchestration of the extraction pipeline
//!
//! A world runs in two phases. The classification pass stitches, aligns,
//! crops and classifies every elevation and folds their extents into one
//! overall extent. Only once every elevation has been classified does the
//! resampling pass crop each mask to that shared extent and emit one grid per
//! elevation. The phases are separate types so the overall extent can only
//! be read after it is complete, and it is dropped with the world.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::algorithm::registration::{Plausibility, Registration, RegistrationAligner};
use crate::algorithm::resample::{AxisOrder, GridResampler};
use crate::algorithm::stitching::{Stitcher, panorama_path, stitch_cached};
use crate::analysis::classifier::TileClassifier;
use crate::io::configuration::{
    CROPPED_PREFIX, DEFAULT_EMBARK_SIZE, GAP_CLOSING_ITERATIONS, IMAGE_EXTENSION,
};
use crate::io::discovery::{ElevationInput, WorldInput, discover_elevations, discover_text_grids};
use crate::io::error::{ErrorScope, MapError, Result, WithContext};
use crate::io::export::GridSink;
use crate::io::image::{load_rgb, save_rgb};
use crate::io::text_grid::read_text_grid;
use crate::spatial::extent::{Extent, OverallExtent, find_extent};
use crate::spatial::grid::EmbarkGrid;
use crate::spatial::mask::Mask;

/// Order elevations are emitted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElevationOrder {
    /// Highest elevation first
    #[default]
    Descending,
    /// Lowest elevation first
    Ascending,
}

impl ElevationOrder {
    /// Sort items by their elevation index
    pub fn sort_by_index<T>(self, items: &mut [T], index: impl Fn(&T) -> i32) {
        match self {
            Self::Descending => items.sort_by_key(|item| std::cmp::Reverse(index(item))),
            Self::Ascending => items.sort_by_key(|item| index(item)),
        }
    }
}

/// Runtime settings for one batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Embark side length in 48-tile blocks
    pub embark_size: usize,
    /// Pixel classifier
    pub classifier: TileClassifier,
    /// Apply morphological closing after classification
    pub close_gaps: bool,
    /// Axis mapping used by the resampler
    pub axis_order: AxisOrder,
    /// Emission order
    pub order: ElevationOrder,
    /// Registration sanity limits
    pub plausibility: Plausibility,
    /// Ignore existing panoramas and stitch again
    pub restitch: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            embark_size: DEFAULT_EMBARK_SIZE,
            classifier: TileClassifier::default(),
            close_gaps: false,
            axis_order: AxisOrder::default(),
            order: ElevationOrder::default(),
            plausibility: Plausibility::default(),
            restitch: false,
        }
    }
}

/// Hooks for reporting pipeline progress
///
/// Called from worker threads during the classification pass.
pub trait PipelineObserver: Sync {
    /// A world's elevations were discovered
    fn elevations_found(&self, _count: usize) {}

    /// One elevation finished its classification pass, successfully or not
    fn elevation_done(&self, _label: &str) {}
}

impl PipelineObserver for () {}

/// One elevation after the classification pass
#[derive(Debug, Clone)]
pub struct ClassifiedElevation {
    /// Elevation index
    pub index: i32,
    /// Directory label
    pub label: String,
    /// Classified pixels of the cropped panorama
    pub mask: Mask,
    /// Bounds of the classified terrain, `None` when there is none
    pub extent: Option<Extent>,
    /// Where the registration mark was found
    pub registration: Registration,
}

/// An elevation that could not be processed
#[derive(Debug)]
pub struct ElevationFailure {
    /// Elevation index
    pub index: i32,
    /// Directory label
    pub label: String,
    /// Cause
    pub error: MapError,
}

/// First phase: collects classified elevations and folds their extents
#[derive(Debug, Default)]
pub struct ClassificationPass {
    overall: OverallExtent,
    elevations: Vec<ClassifiedElevation>,
    failures: Vec<ElevationFailure>,
}

impl ClassificationPass {
    /// Empty pass
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a classified elevation
    pub fn admit(&mut self, elevation: ClassifiedElevation) {
        self.overall.include(elevation.extent);
        self.elevations.push(elevation);
    }

    /// Record an elevation that failed
    pub fn record_failure(&mut self, index: i32, label: &str, error: MapError) {
        log::error!("Elevation {label} failed: {error}");
        self.failures.push(ElevationFailure {
            index,
            label: label.to_string(),
            error,
        });
    }

    /// Extent folded so far
    pub const fn overall(&self) -> &OverallExtent {
        &self.overall
    }

    /// Close the pass; the overall extent is fixed from here on
    pub fn finish(self) -> ResamplingPass {
        log::info!(
            "Overall extent {:?} from {} elevations",
            self.overall.extent(),
            self.overall.contributions()
        );
        ResamplingPass {
            overall: self.overall,
            elevations: self.elevations,
            failures: self.failures,
        }
    }
}

/// Second phase: resamples every elevation against the fixed overall extent
#[derive(Debug)]
pub struct ResamplingPass {
    overall: OverallExtent,
    elevations: Vec<ClassifiedElevation>,
    failures: Vec<ElevationFailure>,
}

impl ResamplingPass {
    /// The overall extent every elevation is cropped to
    pub const fn overall(&self) -> Option<Extent> {
        self.overall.extent()
    }

    /// Resample each elevation and hand the grids to the sink in `order`
    ///
    /// With no overall extent (no elevation had terrain) every grid is empty.
    /// Elevation-scoped failures are recorded in the report.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails
    pub fn emit(
        mut self,
        world: &str,
        resampler: &GridResampler,
        order: ElevationOrder,
        sink: &mut dyn GridSink,
    ) -> Result<WorldReport> {
        order.sort_by_index(&mut self.elevations, |e| e.index);
        let overall = self.overall.extent();
        let mut emitted = Vec::with_capacity(self.elevations.len());

        sink.begin_world(world)?;
        for elevation in &self.elevations {
            let grid = match overall {
                Some(extent) => resampler.resample_mask(&elevation.mask, Some(&extent)),
                None => Ok(EmbarkGrid::new(resampler.side(), resampler.side())),
            };
            match grid {
                Ok(grid) => {
                    log::info!(
                        "Elevation {} resampled to {} marked tiles",
                        elevation.label,
                        grid.len()
                    );
                    sink.emit(elevation.index, &grid)?;
                    emitted.push(elevation.index);
                }
                Err(error) if error.scope() == ErrorScope::Elevation => {
                    log::error!("Elevation {} failed: {error}", elevation.label);
                    self.failures.push(ElevationFailure {
                        index: elevation.index,
                        label: elevation.label.clone(),
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }
        sink.finish_world()?;

        Ok(WorldReport {
            world: world.to_string(),
            emitted,
            failures: self.failures,
            overall,
        })
    }
}

/// Outcome of one world
#[derive(Debug)]
pub struct WorldReport {
    /// World name
    pub world: String,
    /// Elevation indices handed to the sink, in emission order
    pub emitted: Vec<i32>,
    /// Elevations that failed
    pub failures: Vec<ElevationFailure>,
    /// Shared crop of every elevation
    pub overall: Option<Extent>,
}

impl WorldReport {
    /// Whether every elevation was emitted
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Worlds that were processed
    pub worlds: Vec<WorldReport>,
    /// Worlds that failed as a whole
    pub world_failures: Vec<(String, MapError)>,
}

impl BatchReport {
    /// Add the outcome of one world
    ///
    /// World- and elevation-scoped errors are kept in the report.
    ///
    /// # Errors
    ///
    /// Returns batch-scoped errors unchanged
    pub fn record(&mut self, world: &str, outcome: Result<WorldReport>) -> Result<()> {
        match outcome {
            Ok(report) => self.worlds.push(report),
            Err(error) if error.scope() == ErrorScope::Batch => return Err(error),
            Err(error) => {
                log::error!("World {world} failed: {error}");
                self.world_failures.push((world.to_string(), error));
            }
        }
        Ok(())
    }

    /// Whether any world or elevation failed
    pub fn has_failures(&self) -> bool {
        !self.world_failures.is_empty() || self.worlds.iter().any(|w| !w.is_complete())
    }

    /// Total number of grids emitted
    pub fn emitted(&self) -> usize {
        self.worlds.iter().map(|w| w.emitted.len()).sum()
    }
}

/// Path of the cropped panorama written for inspection
pub fn cropped_path(elevation: &ElevationInput) -> PathBuf {
    elevation
        .dir
        .with_file_name(format!("{CROPPED_PREFIX}{}.{IMAGE_EXTENSION}", elevation.label))
}

/// Runs the screenshot pipeline for whole worlds
#[derive(Debug)]
pub struct ElevationSetAssembler<S> {
    stitcher: S,
    aligner: RegistrationAligner,
    resampler: GridResampler,
    config: PipelineConfig,
}

impl<S: Stitcher + Sync> ElevationSetAssembler<S> {
    /// Assemble a pipeline; the config's plausibility limits replace the
    /// aligner's
    ///
    /// # Errors
    ///
    /// Returns an error if the embark size is zero
    pub fn new(stitcher: S, aligner: RegistrationAligner, config: PipelineConfig) -> Result<Self> {
        let resampler =
            GridResampler::binary(config.embark_size)?.with_axis_order(config.axis_order);
        if !config.plausibility.checks_scale() {
            log::warn!(
                "No expected tile size given; registration scale is unchecked and a wrong match can crop the wrong region"
            );
        }
        Ok(Self {
            stitcher,
            aligner: aligner.with_plausibility(config.plausibility),
            resampler,
            config,
        })
    }

    /// Active configuration
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The stitcher in use
    pub const fn stitcher(&self) -> &S {
        &self.stitcher
    }

    /// Stitch, align, crop and classify one elevation
    ///
    /// # Errors
    ///
    /// Returns an elevation-scoped error if any stage fails, including
    /// writing the panorama or the cropped preview
    pub fn classify_elevation(&self, elevation: &ElevationInput) -> Result<ClassifiedElevation> {
        let label = elevation.label.as_str();
        if self.config.restitch {
            remove_panorama(&elevation.dir).within_elevation(label)?;
        }
        let stitched = stitch_cached(
            &self.stitcher,
            label,
            &elevation.dir,
            &elevation.screenshots,
        )?;
        let panorama = load_rgb(&stitched.path)?;

        let registration = self.aligner.align(label, &panorama)?;
        let crop =
            registration.embark_crop(self.config.embark_size, panorama.width(), panorama.height());
        if crop.is_clamped() {
            log::warn!(
                "Elevation {label}: embark needs {0}x{0} pixels but only {1}x{2} fit in the panorama",
                crop.requested,
                crop.width,
                crop.height
            );
        }
        let cropped = crop.apply(&panorama);
        let cropped_file = cropped_path(elevation);
        log::info!(
            "Cropped {}x{} pixels at ({}, {}) to {}",
            crop.width,
            crop.height,
            crop.x,
            crop.y,
            cropped_file.display()
        );
        save_rgb(&cropped, &cropped_file).within_elevation(label)?;

        let mut mask = self.config.classifier.classify(&cropped);
        if self.config.close_gaps {
            let radius = (registration.tile_size() as usize).div_ceil(2);
            mask = mask.close(radius, GAP_CLOSING_ITERATIONS);
        }
        let extent = find_extent(&mask, self.config.classifier.connectivity());
        log::info!(
            "Elevation {label}: {} underground pixels, extent {extent:?}",
            mask.count()
        );

        Ok(ClassifiedElevation {
            index: elevation.index,
            label: label.to_string(),
            mask,
            extent,
            registration,
        })
    }

    /// Run the classification pass over every elevation of a world
    ///
    /// Elevations are classified in parallel; the fold does not depend on
    /// completion order.
    ///
    /// # Errors
    ///
    /// Returns world- or batch-scoped errors; elevation-scoped errors are
    /// recorded in the pass
    pub fn classify_world(
        &self,
        world: &WorldInput,
        observer: &dyn PipelineObserver,
    ) -> Result<ClassificationPass> {
        let elevations = discover_elevations(&world.dir)?;
        log::info!(
            "World {}: {} elevations found",
            world.name,
            elevations.len()
        );
        observer.elevations_found(elevations.len());

        let outcomes: Vec<Result<ClassifiedElevation>> = elevations
            .par_iter()
            .map(|elevation| {
                let outcome = self.classify_elevation(elevation);
                observer.elevation_done(&elevation.label);
                outcome
            })
            .collect();

        let mut pass = ClassificationPass::new();
        for (input, outcome) in elevations.iter().zip(outcomes) {
            match outcome {
                Ok(classified) => pass.admit(classified),
                Err(error) if error.scope() == ErrorScope::Elevation => {
                    pass.record_failure(input.index, &input.label, error);
                }
                Err(error) => return Err(error),
            }
        }
        Ok(pass)
    }

    /// Process one world end to end
    ///
    /// # Errors
    ///
    /// Returns world- or batch-scoped errors
    pub fn run_world(&self, world: &WorldInput, sink: &mut dyn GridSink) -> Result<WorldReport> {
        self.run_world_observed(world, sink, &())
    }

    /// Process one world end to end, reporting progress to `observer`
    ///
    /// # Errors
    ///
    /// Returns world- or batch-scoped errors
    pub fn run_world_observed(
        &self,
        world: &WorldInput,
        sink: &mut dyn GridSink,
        observer: &dyn PipelineObserver,
    ) -> Result<WorldReport> {
        self.classify_world(world, observer)?
            .finish()
            .emit(&world.name, &self.resampler, self.config.order, sink)
    }
}

fn remove_panorama(elevation_dir: &Path) -> Result<()> {
    let path = panorama_path(elevation_dir);
    if path.exists() {
        log::info!("Removing cached panorama {}", path.display());
        std::fs::remove_file(&path).map_err(|e| MapError::FileSystem {
            path,
            operation: "remove cached panorama",
            source: e,
        })?;
    }
    Ok(())
}

/// Load every text grid of a world and hand them to the sink
///
/// All grids of a world must share dimensions.
///
/// # Errors
///
/// Returns [`MapError::NoElevations`] for a world without grids,
/// [`MapError::MalformedTextGrid`] or [`MapError::UnknownTerrain`] for bad
/// files, or an error if the sink fails
pub fn run_text_world(
    world: &WorldInput,
    order: ElevationOrder,
    sink: &mut dyn GridSink,
) -> Result<WorldReport> {
    let mut files = discover_text_grids(&world.dir)?;
    order.sort_by_index(&mut files, |(index, _)| *index);

    let mut grids = Vec::with_capacity(files.len());
    for (index, path) in &files {
        let grid = read_text_grid(path)?;
        if let Some((_, first)) = grids.first() {
            check_same_shape(first, &grid, path)?;
        }
        grids.push((*index, grid));
    }

    sink.begin_world(&world.name)?;
    for (index, grid) in &grids {
        sink.emit(*index, grid)?;
    }
    sink.finish_world()?;

    Ok(WorldReport {
        world: world.name.clone(),
        emitted: grids.iter().map(|(index, _)| *index).collect(),
        failures: Vec::new(),
        overall: None,
    })
}

fn check_same_shape(first: &EmbarkGrid, grid: &EmbarkGrid, path: &Path) -> Result<()> {
    if grid.rows() != first.rows() {
        return Err(MapError::MalformedTextGrid {
            path: path.to_path_buf(),
            line: grid.rows().min(first.rows()) + 1,
            expected: first.rows(),
            found: grid.rows(),
        });
    }
    if grid.cols() != first.cols() {
        return Err(MapError::MalformedTextGrid {
            path: path.to_path_buf(),
            line: 1,
            expected: first.cols(),
            found: grid.cols(),
        });
    }
    Ok(())
}
