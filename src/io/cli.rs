//! Command-line interface for batch extraction over a directory of worlds

use crate::algorithm::assembler::{
    BatchReport, ElevationOrder, ElevationSetAssembler, PipelineConfig, PipelineObserver,
    WorldReport, run_text_world,
};
use crate::algorithm::registration::{Plausibility, RegistrationAligner};
use crate::algorithm::resample::AxisOrder;
use crate::algorithm::stitching::FeatureStitcher;
use crate::analysis::classifier::TileClassifier;
use crate::io::configuration::{
    DEFAULT_BASE_DIR, DEFAULT_EMBARK_SIZE, DEFAULT_MARKER_PATH, DEFAULT_MIN_MATCH_SCORE,
    DEFAULT_MIN_REGION_AREA, DEFAULT_OUTPUT_DIR, DEFAULT_SCALE_TOLERANCE, DEFAULT_SEED,
};
use crate::io::discovery::{WorldInput, discover_worlds};
use crate::io::error::{Result, invalid_parameter};
use crate::io::export::DirectorySink;
use crate::io::palette::{Palette, PalettePolicy};
use crate::io::progress::ProgressManager;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dfmap")]
#[command(
    author,
    version,
    about = "Extract per-elevation embark grids from Dwarf Fortress minimap screenshots"
)]
/// Command-line arguments for the extraction tool
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Directory holding one sub-directory per world
    #[arg(value_name = "BASE", default_value = DEFAULT_BASE_DIR)]
    pub base: PathBuf,

    /// Only process this world
    #[arg(short, long)]
    pub world: Option<String>,

    /// Registration mark image
    #[arg(short, long, default_value = DEFAULT_MARKER_PATH)]
    pub marker: PathBuf,

    /// Embark side length in 48-tile blocks
    #[arg(short, long, default_value_t = DEFAULT_EMBARK_SIZE)]
    pub embark_size: usize,

    /// Output directory for grids and previews
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Read pre-classified elevation-<n>.txt grids instead of screenshots
    #[arg(short, long)]
    pub text_grids: bool,

    /// Colour policy for grid previews
    #[arg(short, long, value_enum, default_value_t = PalettePolicy::Binary)]
    pub palette: PalettePolicy,

    /// Emit the lowest elevation first
    #[arg(short, long)]
    pub ascending: bool,

    /// Expected pixels per tile; enables the registration scale check
    #[arg(long)]
    pub tile_size: Option<f64>,

    /// Allowed relative deviation from the expected tile size
    #[arg(long, default_value_t = DEFAULT_SCALE_TOLERANCE)]
    pub tolerance: f64,

    /// Minimum registration match score (0 disables the check)
    #[arg(long, default_value_t = DEFAULT_MIN_MATCH_SCORE)]
    pub min_score: f64,

    /// Minimum pixel area of a classified region
    #[arg(long, default_value_t = DEFAULT_MIN_REGION_AREA)]
    pub min_area: usize,

    /// Close small gaps in classified terrain
    #[arg(short, long)]
    pub close_gaps: bool,

    /// Map source rows to grid columns
    #[arg(long)]
    pub transpose: bool,

    /// Random seed for stitching
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Stitch again even if a panorama already exists
    #[arg(short, long)]
    pub restitch: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Pipeline settings described by the arguments
    ///
    /// # Errors
    ///
    /// Returns an error for a zero embark size or out-of-range limits
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        if self.embark_size == 0 {
            return Err(invalid_parameter(
                "embark-size",
                &self.embark_size,
                &"embark must span at least one block",
            ));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(invalid_parameter(
                "tolerance",
                &self.tolerance,
                &"must be a non-negative fraction",
            ));
        }
        if let Some(tile_size) = self.tile_size
            && (tile_size.is_nan() || tile_size <= 0.0)
        {
            return Err(invalid_parameter(
                "tile-size",
                &tile_size,
                &"must be a positive pixel count",
            ));
        }

        Ok(PipelineConfig {
            embark_size: self.embark_size,
            classifier: TileClassifier::default().with_min_area(self.min_area),
            close_gaps: self.close_gaps,
            axis_order: if self.transpose {
                AxisOrder::Transposed
            } else {
                AxisOrder::RowMajor
            },
            order: if self.ascending {
                ElevationOrder::Ascending
            } else {
                ElevationOrder::Descending
            },
            plausibility: Plausibility {
                expected_tile_px: self.tile_size,
                tolerance: self.tolerance,
                min_score: (self.min_score > 0.0).then_some(self.min_score),
            },
            restitch: self.restitch,
        })
    }
}

/// Orchestrates a batch run over every world with progress tracking
pub struct BatchProcessor {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl BatchProcessor {
    /// Create a new batch processor with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Process all worlds according to CLI arguments
    ///
    /// World- and elevation-level failures are collected in the report.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are invalid, the base directory or
    /// marker cannot be read, or output cannot be written
    pub fn process(&mut self) -> Result<BatchReport> {
        let config = self.cli.pipeline_config()?;
        let worlds = discover_worlds(&self.cli.base, self.cli.world.as_deref())?;
        log::info!(
            "Found {} worlds in {}",
            worlds.len(),
            self.cli.base.display()
        );

        let mut sink = DirectorySink::new(&self.cli.output, Palette::from_policy(self.cli.palette));
        let mut report = BatchReport::default();
        if worlds.is_empty() {
            return Ok(report);
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(worlds.len());
        }

        if self.cli.text_grids {
            for world in &worlds {
                self.process_world(world, &mut report, |world, _| {
                    run_text_world(world, config.order, &mut sink)
                })?;
            }
        } else {
            let aligner = RegistrationAligner::from_path(&self.cli.marker)?;
            let assembler =
                ElevationSetAssembler::new(FeatureStitcher::with_seed(self.cli.seed), aligner, config)?;
            for world in &worlds {
                self.process_world(world, &mut report, |world, observer| {
                    assembler.run_world_observed(world, &mut sink, observer)
                })?;
            }
        }

        if let Some(ref pm) = self.progress_manager {
            pm.finish();
        }

        log::info!(
            "Emitted {} grids from {} worlds ({} failed)",
            report.emitted(),
            report.worlds.len(),
            report.world_failures.len()
        );
        Ok(report)
    }

    fn process_world(
        &mut self,
        world: &WorldInput,
        report: &mut BatchReport,
        run: impl FnOnce(&WorldInput, &dyn PipelineObserver) -> Result<WorldReport>,
    ) -> Result<()> {
        let progress = self.progress_manager.as_mut().map(|pm| pm.start_world(&world.name));
        let outcome = match &progress {
            Some(observer) => run(world, observer),
            None => run(world, &()),
        };
        let ok = outcome.as_ref().is_ok_and(|r| r.is_complete());
        if let (Some(pm), Some(progress)) = (&self.progress_manager, &progress) {
            pm.complete_world(progress, ok);
        }
        report.record(&world.name, outcome)
    }
}
