//! Connected-component labeling over binary masks

use ndarray::Array2;

use crate::spatial::extent::Extent;
use crate::spatial::mask::Mask;

/// Pixel adjacency used when grouping set pixels into regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Edge neighbours only
    Four,
    /// Edge and diagonal neighbours
    #[default]
    Eight,
}

impl Connectivity {
    const FOUR: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    const EIGHT: [(isize, isize); 8] = [
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, -1),
        (1, 0),
        (1, 1),
    ];

    /// Relative `(row, col)` offsets of neighbouring pixels
    pub const fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Four => &Self::FOUR,
            Self::Eight => &Self::EIGHT,
        }
    }
}

/// Statistics of one connected region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Label assigned in the label raster (1-based)
    pub label: u32,
    /// Number of pixels
    pub area: usize,
    /// Bounding rectangle
    pub bounds: Extent,
}

/// Label every connected region of set pixels
///
/// Returns a label raster (0 for unset pixels, otherwise the 1-based
/// component label) and per-component statistics ordered by label.
/// Labels are assigned in row-major order of each region's first pixel.
pub fn label_components(mask: &Mask, connectivity: Connectivity) -> (Array2<u32>, Vec<Component>) {
    let (height, width) = (mask.height(), mask.width());
    let mut labels = Array2::<u32>::zeros((height, width));
    let mut components = Vec::new();
    let mut stack = Vec::new();

    for (row, col) in mask.iter_set() {
        if labels.get((row, col)).copied().unwrap_or(0) != 0 {
            continue;
        }

        let label = u32::try_from(components.len() + 1).unwrap_or(u32::MAX);
        let mut component = Component {
            label,
            area: 0,
            bounds: Extent::pixel(row, col),
        };

        if let Some(cell) = labels.get_mut((row, col)) {
            *cell = label;
        }
        stack.push((row, col));

        while let Some((r, c)) = stack.pop() {
            component.area += 1;
            component.bounds = component.bounds.union(Extent::pixel(r, c));

            for &(dr, dc) in connectivity.offsets() {
                let (Some(nr), Some(nc)) = (r.checked_add_signed(dr), c.checked_add_signed(dc))
                else {
                    continue;
                };
                if !mask.get(nr, nc) {
                    continue;
                }
                if let Some(cell) = labels.get_mut((nr, nc))
                    && *cell == 0
                {
                    *cell = label;
                    stack.push((nr, nc));
                }
            }
        }

        components.push(component);
    }

    (labels, components)
}

/// Clear every connected region smaller than `min_area` pixels
///
/// With `min_area` of 0 or 1 the mask is returned unchanged.
pub fn remove_small_regions(mask: &Mask, min_area: usize, connectivity: Connectivity) -> Mask {
    if min_area <= 1 {
        return mask.clone();
    }

    let (labels, components) = label_components(mask, connectivity);
    let keep: Vec<bool> = components.iter().map(|c| c.area >= min_area).collect();

    Mask::from_fn(mask.height(), mask.width(), |row, col| {
        labels
            .get((row, col))
            .copied()
            .filter(|&label| label > 0)
            .and_then(|label| keep.get(label as usize - 1).copied())
            .unwrap_or(false)
    })
}
