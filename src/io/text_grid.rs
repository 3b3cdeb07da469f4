//! Character-coded elevation grids (`elevation-<n>.txt`)
//!
//! One line per grid row and one glyph per column; see
//! [`TileClass::from_glyph`] for the glyph table. Only line terminators are
//! stripped, since a leading or trailing space is an open tile.

use std::path::Path;

use crate::io::configuration::{ELEVATION_PREFIX, TEXT_GRID_EXTENSION};
use crate::io::error::{MapError, Result, WithContext};
use crate::spatial::grid::EmbarkGrid;
use crate::spatial::terrain::TileClass;

/// Parse text grid content
///
/// Trailing blank lines are ignored. `path` is only used for error reports.
///
/// # Errors
///
/// Returns [`MapError::MalformedTextGrid`] when rows differ in length and
/// [`MapError::UnknownTerrain`] for glyphs outside the table
pub fn parse_text_grid(content: &str, path: &Path) -> Result<EmbarkGrid> {
    let mut lines: Vec<&str> = content
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    let cols = lines.first().map_or(0, |line| line.chars().count());
    let mut grid = EmbarkGrid::new(lines.len(), cols);

    for (row, line) in lines.iter().enumerate() {
        let found = line.chars().count();
        if found != cols {
            return Err(MapError::MalformedTextGrid {
                path: path.to_path_buf(),
                line: row + 1,
                expected: cols,
                found,
            });
        }
        for (col, glyph) in line.chars().enumerate() {
            let class = TileClass::from_glyph(glyph).ok_or_else(|| MapError::UnknownTerrain {
                path: path.to_path_buf(),
                line: row + 1,
                column: col + 1,
                glyph,
            })?;
            grid.set(row, col, class);
        }
    }

    Ok(grid)
}

/// Read and parse a text grid file
///
/// # Errors
///
/// Returns an error if the file cannot be read or is malformed
pub fn read_text_grid(path: &Path) -> Result<EmbarkGrid> {
    let content = std::fs::read_to_string(path).with_operation(path, "read text grid")?;
    parse_text_grid(&content, path)
}

/// Format a grid as text, one line per row
pub fn format_text_grid(grid: &EmbarkGrid) -> String {
    let mut out = String::with_capacity(grid.rows() * (grid.cols() + 1));
    for row in grid.to_rows() {
        out.extend(row.into_iter().map(TileClass::glyph));
        out.push('\n');
    }
    out
}

/// Write a grid as a text file, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written
pub fn write_text_grid(grid: &EmbarkGrid, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_operation(parent, "create directory")?;
    }
    std::fs::write(path, format_text_grid(grid)).with_operation(path, "write text grid")
}

/// File name used for an elevation's text grid
pub fn text_grid_file_name(elevation: i32) -> String {
    format!("{ELEVATION_PREFIX}{elevation}.{TEXT_GRID_EXTENSION}")
}

/// Elevation index encoded in an `elevation-<n>.txt` file name
///
/// `elevation-12.txt` is 12 and `elevation--3.txt` is -3.
pub fn text_grid_elevation(path: &Path) -> Option<i32> {
    if path.extension()?.to_str()? != TEXT_GRID_EXTENSION {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(ELEVATION_PREFIX)?
        .parse()
        .ok()
}
