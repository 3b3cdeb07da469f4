//! Error types and scope classification for pipeline operations

use std::fmt;
use std::path::{Path, PathBuf};

use crate::spatial::terrain::TileClass;

/// How far a failure propagates through a batch run
///
/// Ordered from narrowest to broadest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorScope {
    /// Aborts one elevation; the rest of the world continues
    Elevation,
    /// Aborts one world; other worlds in the batch continue
    World,
    /// Aborts the whole run
    Batch,
}

/// Main error type for all pipeline operations
#[derive(Debug)]
pub enum MapError {
    /// Failed to load a raster image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save a raster image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A world directory holds no usable elevation inputs
    NoElevations {
        /// World directory that was searched
        world: PathBuf,
    },

    /// Screenshots of one elevation could not be composed into a panorama
    Stitching {
        /// Elevation label (directory name)
        elevation: String,
        /// What went wrong
        reason: String,
    },

    /// Registration mark match is too weak or implies an impossible tile scale
    AlignmentImplausible {
        /// Elevation label (directory name)
        elevation: String,
        /// Description of the failed plausibility check
        reason: String,
    },

    /// Legacy text grid rows disagree on geometry
    MalformedTextGrid {
        /// Offending file
        path: PathBuf,
        /// One-based line number of the first bad row
        line: usize,
        /// Expected row length or row count
        expected: usize,
        /// Actual row length or row count
        found: usize,
    },

    /// Legacy text grid contains a glyph with no terrain meaning
    UnknownTerrain {
        /// Offending file
        path: PathBuf,
        /// One-based line number
        line: usize,
        /// One-based column number
        column: usize,
        /// The unrecognised character
        glyph: char,
    },

    /// Two elevations of one world resolve to the same index
    DuplicateElevation {
        /// World directory
        world: PathBuf,
        /// Shared index
        index: i32,
        /// Name of the elevation that claimed the index first
        first: String,
        /// Name of the elevation that collided with it
        second: String,
    },

    /// A grid holds a class the export palette has no colour for
    MissingColor {
        /// Class without a colour
        class: TileClass,
        /// Number of classes the palette does cover
        entries: usize,
    },

    /// A failure confined to one elevation
    InElevation {
        /// Elevation label (directory name)
        elevation: String,
        /// Underlying error
        source: Box<MapError>,
    },

    /// A failure confined to one world
    InWorld {
        /// World directory
        world: PathBuf,
        /// Underlying error
        source: Box<MapError>,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Numerical computation produced invalid result
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },
}

impl MapError {
    /// Scope of the failure within a batch run
    pub const fn scope(&self) -> ErrorScope {
        match self {
            Self::Stitching { .. }
            | Self::AlignmentImplausible { .. }
            | Self::Computation { .. }
            | Self::ImageLoad { .. }
            | Self::InElevation { .. } => ErrorScope::Elevation,
            Self::NoElevations { .. }
            | Self::MalformedTextGrid { .. }
            | Self::UnknownTerrain { .. }
            | Self::DuplicateElevation { .. }
            | Self::MissingColor { .. }
            | Self::InWorld { .. } => ErrorScope::World,
            Self::ImageExport { .. } | Self::FileSystem { .. } | Self::InvalidParameter { .. } => {
                ErrorScope::Batch
            }
        }
    }

    /// Confine the error to one elevation
    ///
    /// Errors already scoped to a single elevation are returned unchanged.
    #[must_use]
    pub fn within_elevation(self, elevation: &str) -> Self {
        if self.scope() > ErrorScope::Elevation {
            Self::InElevation {
                elevation: elevation.to_string(),
                source: Box::new(self),
            }
        } else {
            self
        }
    }

    /// Confine the error to one world
    ///
    /// Errors scoped to a world or a single elevation are returned unchanged.
    #[must_use]
    pub fn within_world(self, world: &Path) -> Self {
        if self.scope() > ErrorScope::World {
            Self::InWorld {
                world: world.to_path_buf(),
                source: Box::new(self),
            }
        } else {
            self
        }
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::NoElevations { world } => {
                write!(f, "'{}' contains no elevation inputs", world.display())
            }
            Self::Stitching { elevation, reason } => {
                write!(f, "Stitching failed for elevation '{elevation}': {reason}")
            }
            Self::AlignmentImplausible { elevation, reason } => {
                write!(
                    f,
                    "Registration mark alignment implausible for elevation '{elevation}': {reason}"
                )
            }
            Self::MalformedTextGrid {
                path,
                line,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Malformed text grid '{}' at line {line}: expected {expected}, found {found}",
                    path.display()
                )
            }
            Self::UnknownTerrain {
                path,
                line,
                column,
                glyph,
            } => {
                write!(
                    f,
                    "Unknown terrain glyph {glyph:?} in '{}' at line {line}, column {column}",
                    path.display()
                )
            }
            Self::DuplicateElevation {
                world,
                index,
                first,
                second,
            } => {
                write!(
                    f,
                    "Elevations '{first}' and '{second}' in '{}' both map to index {index}",
                    world.display()
                )
            }
            Self::MissingColor { class, entries } => {
                write!(f, "No colour for class '{class}' among {entries} palette entries")
            }
            Self::InElevation { elevation, source } => {
                write!(f, "Elevation '{elevation}': {source}")
            }
            Self::InWorld { world, source } => {
                write!(f, "World '{}': {source}", world.display())
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            Self::InElevation { source, .. } | Self::InWorld { source, .. } => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }
}

/// Convenience type alias for pipeline results
pub type Result<T> = std::result::Result<T, MapError>;

const UNKNOWN_PATH: &str = "<unknown>";

/// Enriches converted errors with the path they concern
pub trait WithContext<T> {
    /// Attach a path to errors that were converted without one
    ///
    /// # Errors
    ///
    /// Propagates the original error with the path filled in
    fn with_path(self, path: &Path) -> Result<T>;

    /// Attach a path and operation name to converted I/O errors
    ///
    /// # Errors
    ///
    /// Propagates the original error with path and operation filled in
    fn with_operation(self, path: &Path, operation: &'static str) -> Result<T>;

    /// Confine errors to one elevation, see [`MapError::within_elevation`]
    ///
    /// # Errors
    ///
    /// Propagates the original error, wrapped if its scope was broader
    fn within_elevation(self, elevation: &str) -> Result<T>;

    /// Confine errors to one world, see [`MapError::within_world`]
    ///
    /// # Errors
    ///
    /// Propagates the original error, wrapped if its scope was broader
    fn within_world(self, world: &Path) -> Result<T>;
}

impl<T, E> WithContext<T> for std::result::Result<T, E>
where
    E: Into<MapError>,
{
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();
            match &mut error {
                MapError::ImageLoad { path: p, .. }
                | MapError::ImageExport { path: p, .. }
                | MapError::FileSystem { path: p, .. }
                    if p.as_os_str() == UNKNOWN_PATH =>
                {
                    *p = path.to_path_buf();
                }
                _ => {}
            }
            error
        })
    }

    fn with_operation(self, path: &Path, operation: &'static str) -> Result<T> {
        self.with_path(path).map_err(|mut error| {
            if let MapError::FileSystem { operation: op, .. } = &mut error
                && *op == "unknown"
            {
                *op = operation;
            }
            error
        })
    }

    fn within_elevation(self, elevation: &str) -> Result<T> {
        self.map_err(|e| MapError::within_elevation(e.into(), elevation))
    }

    fn within_world(self, world: &Path) -> Result<T> {
        self.map_err(|e| MapError::within_world(e.into(), world))
    }
}

impl From<image::ImageError> for MapError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from(UNKNOWN_PATH),
            source: err,
        }
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from(UNKNOWN_PATH),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MapError {
    MapError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> MapError {
    MapError::Computation {
        operation,
        reason: reason.to_string(),
    }
}
