//! Input/output, configuration and error handling

/// Command-line interface and batch driver
pub mod cli;
/// Compile-time defaults
pub mod configuration;
/// World and elevation discovery
pub mod discovery;
/// Error types and scopes
pub mod error;
/// Grid sinks
pub mod export;
/// Raster loading, saving and previews
pub mod image;
/// Classification colours
pub mod palette;
/// Terminal progress display
pub mod progress;
/// Character-coded grid files
pub mod text_grid;
