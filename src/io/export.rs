//! Destinations for finished elevation grids

use std::path::{Path, PathBuf};

use crate::io::configuration::ELEVATION_PREFIX;
use crate::io::error::{MapError, Result, invalid_parameter};
use crate::io::image::{render_grid, save_rgb};
use crate::io::palette::Palette;
use crate::io::text_grid::{text_grid_file_name, write_text_grid};
use crate::spatial::grid::EmbarkGrid;

/// Receives one grid per elevation, grouped by world
///
/// Calls arrive as `begin_world`, then `emit` once per elevation in the
/// configured order, then `finish_world`.
pub trait GridSink {
    /// Start a new world
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot prepare storage for the world
    fn begin_world(&mut self, world: &str) -> Result<()>;

    /// Store the grid of one elevation
    ///
    /// # Errors
    ///
    /// Returns an error if the grid cannot be written
    fn emit(&mut self, elevation: i32, grid: &EmbarkGrid) -> Result<()>;

    /// Close the current world
    ///
    /// # Errors
    ///
    /// Returns an error if pending output cannot be flushed
    fn finish_world(&mut self) -> Result<()>;
}

/// Grids emitted for one world, in emission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmittedWorld {
    /// World name
    pub name: String,
    /// `(elevation, grid)` pairs
    pub elevations: Vec<(i32, EmbarkGrid)>,
}

/// Keeps everything in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    worlds: Vec<EmittedWorld>,
    open: bool,
}

impl MemorySink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Worlds received so far
    pub fn worlds(&self) -> &[EmittedWorld] {
        &self.worlds
    }

    /// Grids of a world by name
    pub fn world(&self, name: &str) -> Option<&EmittedWorld> {
        self.worlds.iter().find(|w| w.name == name)
    }
}

impl GridSink for MemorySink {
    fn begin_world(&mut self, world: &str) -> Result<()> {
        self.worlds.push(EmittedWorld {
            name: world.to_string(),
            elevations: Vec::new(),
        });
        self.open = true;
        Ok(())
    }

    fn emit(&mut self, elevation: i32, grid: &EmbarkGrid) -> Result<()> {
        match self.worlds.last_mut() {
            Some(world) if self.open => {
                world.elevations.push((elevation, grid.clone()));
                Ok(())
            }
            _ => Err(invalid_parameter(
                "elevation",
                &elevation,
                &"emitted outside of a world",
            )),
        }
    }

    fn finish_world(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }
}

/// Writes `<out>/<world>/elevation-<n>.txt` plus a colour-coded PNG preview
#[derive(Debug, Clone)]
pub struct DirectorySink {
    out_dir: PathBuf,
    palette: Palette,
    current: Option<PathBuf>,
}

impl DirectorySink {
    /// Sink rooted at `out_dir`
    pub fn new(out_dir: impl Into<PathBuf>, palette: Palette) -> Self {
        Self {
            out_dir: out_dir.into(),
            palette,
            current: None,
        }
    }

    /// Output root
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Preview image path for an elevation inside a world directory
    pub fn preview_path(world_dir: &Path, elevation: i32) -> PathBuf {
        world_dir.join(format!("{ELEVATION_PREFIX}{elevation}.png"))
    }
}

impl GridSink for DirectorySink {
    fn begin_world(&mut self, world: &str) -> Result<()> {
        let dir = self.out_dir.join(world);
        std::fs::create_dir_all(&dir).map_err(|e| MapError::FileSystem {
            path: dir.clone(),
            operation: "create directory",
            source: e,
        })?;
        self.current = Some(dir);
        Ok(())
    }

    fn emit(&mut self, elevation: i32, grid: &EmbarkGrid) -> Result<()> {
        let Some(dir) = &self.current else {
            return Err(invalid_parameter(
                "elevation",
                &elevation,
                &"emitted outside of a world",
            ));
        };
        let preview = render_grid(grid, &self.palette)?;
        let text_path = dir.join(text_grid_file_name(elevation));
        write_text_grid(grid, &text_path)?;
        save_rgb(&preview, &Self::preview_path(dir, elevation))?;
        log::info!(
            "Wrote elevation {elevation} ({} marked tiles) to {}",
            grid.len(),
            text_path.display()
        );
        Ok(())
    }

    fn finish_world(&mut self) -> Result<()> {
        self.current = None;
        Ok(())
    }
}
