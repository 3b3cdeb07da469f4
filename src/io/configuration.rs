//! Pipeline constants and runtime configuration defaults

// Game geometry
/// Tiles along one side of a single embark block
pub const TILES_PER_EMBARK_BLOCK: usize = 48;
/// Default embark side length, in embark blocks
pub const DEFAULT_EMBARK_SIZE: usize = 4;
/// Number of tiles the registration mark spans horizontally
pub const MARKER_TILE_SPAN: u32 = 2;

// Tile classification
/// Smallest connected region kept by the classifier, in pixels
pub const DEFAULT_MIN_REGION_AREA: usize = 50;
/// Lower bound of the underground (dark grey) colour band
pub const UNDERGROUND_LOWER: [u8; 3] = [0, 0, 0];
/// Upper bound of the underground (dark grey) colour band
pub const UNDERGROUND_UPPER: [u8; 3] = [56, 56, 56];
/// Dilate/erode passes used when closing gaps between classified tiles
pub const GAP_CLOSING_ITERATIONS: usize = 2;

// Registration plausibility
/// Allowed relative deviation of the measured tile size from the expected one
pub const DEFAULT_SCALE_TOLERANCE: f64 = 0.10;
/// Correlation score below which a registration match is rejected
pub const DEFAULT_MIN_MATCH_SCORE: f64 = 0.5;

// Feature detection for stitching
/// Harris detector sensitivity constant
pub const HARRIS_K: f64 = 0.04;
/// Radius of the structure tensor window
pub const HARRIS_WINDOW_RADIUS: usize = 2;
/// Corner responses below this fraction of the strongest are discarded
pub const HARRIS_RELATIVE_THRESHOLD: f64 = 0.01;
/// Minimum spacing between retained keypoints
pub const KEYPOINT_SUPPRESSION_RADIUS: usize = 3;
/// Upper bound on keypoints kept per screenshot
pub const MAX_KEYPOINTS: usize = 800;
/// Radius of the colour patch used as a keypoint descriptor
pub const DESCRIPTOR_RADIUS: usize = 4;
/// Minimum descriptor correlation for a candidate match
pub const MIN_DESCRIPTOR_SCORE: f64 = 0.9;
/// Required gap between best and second-best descriptor correlation
pub const MATCH_DISTINCTNESS: f64 = 0.05;

// Robust offset estimation
/// Hypotheses drawn when there are more matches than this
pub const RANSAC_ITERATIONS: usize = 500;
/// Maximum per-axis disagreement for a match to support a hypothesis
pub const RANSAC_INLIER_TOLERANCE: f64 = 1.5;
/// Inliers required before two screenshots are considered overlapping
pub const MIN_STITCH_INLIERS: usize = 6;
/// Fixed seed for reproducible offset estimation
pub const DEFAULT_SEED: u64 = 42;

// File layout
/// Directory holding one sub-directory per world
pub const DEFAULT_BASE_DIR: &str = "screenshots";
/// Location of the registration mark image
pub const DEFAULT_MARKER_PATH: &str = "templates/registration-mark.png";
/// Directory receiving exported grids
pub const DEFAULT_OUTPUT_DIR: &str = "maps";
/// Extension of screenshot and panorama files
pub const IMAGE_EXTENSION: &str = "png";
/// Prefix for the cropped panorama written beside the stitched one
pub const CROPPED_PREFIX: &str = "cropped-";
/// Prefix of legacy text grid and exported grid file names
pub const ELEVATION_PREFIX: &str = "elevation-";
/// Extension of legacy text grid files
pub const TEXT_GRID_EXTENSION: &str = "txt";

// Progress bar display settings
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;
