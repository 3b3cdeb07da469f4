//! Locating worlds, elevations and their input files on disk
//!
//! Layout: `<base>/<world>/<elevation>/*.png` for screenshots, or
//! `<base>/<world>/elevation-<n>.txt` for text grids. Stitched panoramas and
//! cropped previews are written as plain files inside the world directory,
//! so they never show up as elevations themselves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::io::configuration::{ELEVATION_PREFIX, IMAGE_EXTENSION};
use crate::io::error::{MapError, Result, WithContext};
use crate::io::text_grid::text_grid_elevation;

/// Screenshots belonging to one elevation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevationInput {
    /// Elevation index used for ordering and export
    pub index: i32,
    /// Directory name, used in logs and file names
    pub label: String,
    /// Directory holding the screenshots
    pub dir: PathBuf,
    /// Screenshot files, sorted by name
    pub screenshots: Vec<PathBuf>,
}

/// A world directory to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldInput {
    /// Directory name
    pub name: String,
    /// World directory
    pub dir: PathBuf,
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)
        .with_operation(dir, "read directory")?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_operation(dir, "read directory")?;
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// World directories under `base`, optionally restricted to one name
///
/// # Errors
///
/// Returns an error if `base` cannot be read
pub fn discover_worlds(base: &Path, only: Option<&str>) -> Result<Vec<WorldInput>> {
    Ok(sorted_entries(base)?
        .into_iter()
        .filter(|path| path.is_dir())
        .map(|dir| WorldInput {
            name: file_name(&dir),
            dir,
        })
        .filter(|world| only.is_none_or(|name| world.name == name))
        .collect())
}

/// Elevation index spelled by a directory name
///
/// Accepts an optional `elevation-` prefix before a signed integer.
pub fn parse_elevation_index(name: &str) -> Option<i32> {
    name.strip_prefix(ELEVATION_PREFIX).unwrap_or(name).parse().ok()
}

/// Resolve the index of every elevation name, in input order
///
/// Names that spell an index keep it. The others count up from their position
/// in `names`, skipping any index already taken, so no two names share one.
///
/// # Errors
///
/// Returns [`MapError::DuplicateElevation`] if two names spell the same index
pub fn assign_elevation_indices(world: &Path, names: &[String]) -> Result<Vec<i32>> {
    let parsed: Vec<Option<i32>> = names.iter().map(|n| parse_elevation_index(n)).collect();

    let mut taken: BTreeMap<i32, &str> = BTreeMap::new();
    for (name, index) in names.iter().zip(&parsed) {
        if let Some(index) = *index
            && let Some(first) = taken.insert(index, name)
        {
            return Err(MapError::DuplicateElevation {
                world: world.to_path_buf(),
                index,
                first: first.to_string(),
                second: name.clone(),
            });
        }
    }

    let mut indices = Vec::with_capacity(names.len());
    for (position, (name, index)) in names.iter().zip(parsed).enumerate() {
        let index = index.unwrap_or_else(|| {
            let mut candidate = i32::try_from(position).unwrap_or(i32::MAX);
            while taken.contains_key(&candidate) {
                candidate = candidate.saturating_add(1);
            }
            log::debug!("Elevation {name} has no index in its name, using {candidate}");
            taken.insert(candidate, name);
            candidate
        });
        indices.push(index);
    }
    Ok(indices)
}

/// Screenshot elevations of a world
///
/// # Errors
///
/// Returns [`MapError::NoElevations`] if no sub-directory holds a screenshot,
/// [`MapError::DuplicateElevation`] if two directories name the same index,
/// or a world-scoped error if a directory cannot be read
pub fn discover_elevations(world: &Path) -> Result<Vec<ElevationInput>> {
    let mut found = Vec::new();
    for dir in sorted_entries(world)
        .within_world(world)?
        .into_iter()
        .filter(|p| p.is_dir())
    {
        let screenshots: Vec<PathBuf> = sorted_entries(&dir)
            .within_world(world)?
            .into_iter()
            .filter(|p| p.is_file() && has_extension(p, IMAGE_EXTENSION))
            .collect();
        if screenshots.is_empty() {
            log::debug!("Skipping {}: no screenshots", dir.display());
            continue;
        }
        found.push((file_name(&dir), dir, screenshots));
    }

    if found.is_empty() {
        return Err(MapError::NoElevations {
            world: world.to_path_buf(),
        });
    }

    let labels: Vec<String> = found.iter().map(|(label, _, _)| label.clone()).collect();
    let indices = assign_elevation_indices(world, &labels)?;
    Ok(found
        .into_iter()
        .zip(indices)
        .map(|((label, dir, screenshots), index)| ElevationInput {
            index,
            label,
            dir,
            screenshots,
        })
        .collect())
}

/// Text grid files of a world as `(elevation, path)` pairs
///
/// # Errors
///
/// Returns [`MapError::NoElevations`] if the world holds no
/// `elevation-<n>.txt` file, [`MapError::DuplicateElevation`] if two files
/// name the same index (`elevation-1.txt` and `elevation-01.txt`), or a
/// world-scoped error if the directory cannot be read
pub fn discover_text_grids(world: &Path) -> Result<Vec<(i32, PathBuf)>> {
    let grids: Vec<(i32, PathBuf)> = sorted_entries(world)
        .within_world(world)?
        .into_iter()
        .filter(|p| p.is_file())
        .filter_map(|p| text_grid_elevation(&p).map(|index| (index, p)))
        .collect();

    if grids.is_empty() {
        return Err(MapError::NoElevations {
            world: world.to_path_buf(),
        });
    }

    let mut seen: BTreeMap<i32, &Path> = BTreeMap::new();
    for (index, path) in &grids {
        if let Some(first) = seen.insert(*index, path) {
            return Err(MapError::DuplicateElevation {
                world: world.to_path_buf(),
                index: *index,
                first: file_name(first),
                second: file_name(path),
            });
        }
    }
    Ok(grids)
}
