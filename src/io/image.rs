//! Raster loading, saving and colour-coded grid previews

use std::path::Path;

use image::{Rgb, RgbImage};
use num_traits::ToPrimitive;

use crate::io::error::{MapError, Result};
use crate::io::palette::Palette;
use crate::spatial::grid::EmbarkGrid;

/// Load an image from disk as 8-bit RGB
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|e| MapError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(img.to_rgb8())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MapError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }
    Ok(())
}

/// Save an RGB image, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the image cannot
/// be encoded
pub fn save_rgb(image: &RgbImage, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    image.save(path).map_err(|e| MapError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Render a grid with one pixel per tile, coloured by the palette
///
/// # Errors
///
/// Returns an error if the grid holds a class the palette has no colour for
pub fn render_grid(grid: &EmbarkGrid, palette: &Palette) -> Result<RgbImage> {
    let width = grid.cols().to_u32().unwrap_or(u32::MAX);
    let height = grid.rows().to_u32().unwrap_or(u32::MAX);
    let mut img = RgbImage::from_pixel(width, height, Rgb(palette.open_color()));

    for ((row, col), class) in grid.iter() {
        let color = palette
            .color(class)
            .ok_or_else(|| palette.missing_color(class))?;
        if let (Some(x), Some(y)) = (col.to_u32(), row.to_u32())
            && x < width
            && y < height
        {
            img.put_pixel(x, y, Rgb(color));
        }
    }

    Ok(img)
}

/// Export a grid as a PNG preview
///
/// # Errors
///
/// Returns an error if a class has no palette colour, the parent directory
/// cannot be created, or the image cannot be saved
pub fn export_grid_as_png(grid: &EmbarkGrid, palette: &Palette, output_path: &Path) -> Result<()> {
    let img = render_grid(grid, palette)?;
    save_rgb(&img, output_path)
}
