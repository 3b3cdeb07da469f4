//! Natural cubic splines in one and two dimensions
//!
//! The 2D surface is a tensor product of 1D natural splines: rows are
//! interpolated first, then the intermediate columns. Both axes are
//! parameterised over `[0, 1]` so rasters of any size resample onto the
//! same normalised coordinate space.

use ndarray::Array2;
use std::error::Error;
use std::fmt;

/// Error type for interpolation operations
#[derive(Debug, Clone)]
pub struct InterpolationError {
    message: String,
}

impl fmt::Display for InterpolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interpolation error: {}", self.message)
    }
}

impl Error for InterpolationError {}

impl InterpolationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<InterpolationError> for crate::io::error::MapError {
    fn from(err: InterpolationError) -> Self {
        crate::io::error::computation_error("interpolation", &err.message)
    }
}

/// Cubic spline interpolation with natural boundary conditions
///
/// Provides C2 continuous interpolation through a set of data points
/// using piecewise cubic polynomials. Second derivatives are zero at both
/// ends, so the curve does not overshoot beyond the boundary knots.
#[derive(Debug, Clone)]
pub struct Cubic {
    x_values: Vec<f64>,
    y_values: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl Cubic {
    /// Create a new cubic interpolation from x and y values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `x_values` and `y_values` have different lengths
    /// - Fewer than 2 data points are provided
    /// - The x values are not strictly increasing
    pub fn new(x_values: Vec<f64>, y_values: Vec<f64>) -> Result<Self, InterpolationError> {
        if x_values.len() != y_values.len() {
            return Err(InterpolationError::new(
                "x_values and y_values must have the same length",
            ));
        }

        let n = x_values.len();
        if n < 2 {
            return Err(InterpolationError::new(
                "Need at least 2 points for interpolation",
            ));
        }

        if x_values.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(InterpolationError::new(
                "x values must be strictly increasing",
            ));
        }

        // Tridiagonal decomposition, forward sweep
        let mut second_derivatives = vec![0.0; n];
        let mut u = vec![0.0; n];
        for i in 1..n - 1 {
            let (x_prev, x, x_next) = (x_values[i - 1], x_values[i], x_values[i + 1]);
            let (y_prev, y, y_next) = (y_values[i - 1], y_values[i], y_values[i + 1]);

            let sig = (x - x_prev) / (x_next - x_prev);
            let p = sig.mul_add(second_derivatives[i - 1], 2.0);
            second_derivatives[i] = (sig - 1.0) / p;

            let slope_change = (y_next - y) / (x_next - x) - (y - y_prev) / (x - x_prev);
            u[i] = sig.mul_add(-u[i - 1], 6.0 * slope_change / (x_next - x_prev)) / p;
        }

        // Back substitution; both boundary second derivatives stay zero
        second_derivatives[n - 1] = 0.0;
        for k in (0..n - 1).rev() {
            second_derivatives[k] = second_derivatives[k].mul_add(second_derivatives[k + 1], u[k]);
        }

        Ok(Self {
            x_values,
            y_values,
            second_derivatives,
        })
    }

    /// Evaluate the interpolation at point x
    ///
    /// Uses binary search to find the appropriate spline segment,
    /// then evaluates the cubic polynomial for that segment.
    /// Points outside the data range return the nearest boundary value.
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.x_values.len();
        let (Some(&first_x), Some(&last_x)) = (self.x_values.first(), self.x_values.last()) else {
            return 0.0;
        };

        if x <= first_x {
            return self.y_values.first().copied().unwrap_or(0.0);
        }
        if x >= last_x {
            return self.y_values.last().copied().unwrap_or(0.0);
        }

        // First knot strictly greater than x; guaranteed to be in 1..n
        let khi = self.x_values.partition_point(|&knot| knot <= x).clamp(1, n - 1);
        let klo = khi - 1;

        let h = self.x_values[khi] - self.x_values[klo];
        let a = (self.x_values[khi] - x) / h;
        let b = (x - self.x_values[klo]) / h;

        a * self.y_values[klo]
            + b * self.y_values[khi]
            + ((a.powi(3) - a) * self.second_derivatives[klo]
                + (b.powi(3) - b) * self.second_derivatives[khi])
                * h.powi(2)
                / 6.0
    }
}

/// `n` evenly spaced positions covering `[0, 1]` inclusive
///
/// A single position sits at 0.
pub fn unit_knots(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![0.0; n];
    }
    let last = (n - 1) as f64;
    (0..n).map(|i| i as f64 / last).collect()
}

/// Interpolate one row of samples at normalised positions
fn resample_line(values: &[f64], positions: &[f64]) -> Result<Vec<f64>, InterpolationError> {
    match values {
        [] => Err(InterpolationError::new("Cannot interpolate an empty line")),
        [only] => Ok(vec![*only; positions.len()]),
        _ => {
            let spline = Cubic::new(unit_knots(values.len()), values.to_vec())?;
            Ok(positions.iter().map(|&p| spline.evaluate(p)).collect())
        }
    }
}

/// Bivariate natural spline over a raster on the unit square
///
/// Row index maps to the first normalised coordinate and column index to
/// the second; `(0, 0)` is the top-left sample and `(1, 1)` the bottom-right.
#[derive(Debug, Clone)]
pub struct SplineSurface {
    samples: Array2<f64>,
}

impl SplineSurface {
    /// Wrap a raster of samples
    ///
    /// # Errors
    ///
    /// Returns an error if the raster has no rows or no columns
    pub fn new(samples: Array2<f64>) -> Result<Self, InterpolationError> {
        let (rows, cols) = samples.dim();
        if rows == 0 || cols == 0 {
            return Err(InterpolationError::new(format!(
                "Surface needs at least one sample, got {rows}x{cols}"
            )));
        }
        Ok(Self { samples })
    }

    /// Sample the surface on a regular `rows x cols` lattice spanning the unit square
    ///
    /// # Errors
    ///
    /// Returns an error if a row or column spline cannot be constructed
    pub fn sample_grid(&self, rows: usize, cols: usize) -> Result<Array2<f64>, InterpolationError> {
        let (src_rows, _) = self.samples.dim();
        let row_positions = unit_knots(rows);
        let col_positions = unit_knots(cols);

        let mut along_rows = Array2::<f64>::zeros((src_rows, cols));
        for (src_row, mut out_row) in self.samples.rows().into_iter().zip(along_rows.rows_mut()) {
            let values = resample_line(&src_row.to_vec(), &col_positions)?;
            for (out, value) in out_row.iter_mut().zip(values) {
                *out = value;
            }
        }

        let mut result = Array2::<f64>::zeros((rows, cols));
        for (column, mut out_column) in along_rows.columns().into_iter().zip(result.columns_mut()) {
            let values = resample_line(&column.to_vec(), &row_positions)?;
            for (out, value) in out_column.iter_mut().zip(values) {
                *out = value;
            }
        }

        Ok(result)
    }
}
