//! Normalised cross-correlation template search over RGB rasters
//!
//! Scores follow the zero-mean normalised form: both the template and the
//! image window are shifted to zero mean per channel, and the dot product is
//! divided by the product of their norms summed over all three channels.
//! A perfect match scores 1.0, an inverted one -1.0, and windows or templates
//! with no variance score 0.0.

use image::RgbImage;
use ndarray::Array2;
use rayon::prelude::*;

use crate::io::error::{Result, invalid_parameter};

const CHANNELS: usize = 3;
const FLAT_VARIANCE: f64 = 1e-9;

/// Best template position found by [`match_template`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch {
    /// Column of the template's top-left pixel
    pub x: u32,
    /// Row of the template's top-left pixel
    pub y: u32,
    /// Normalised correlation score in `[-1, 1]`
    pub score: f64,
}

/// Summed-area table of one channel and its squares
struct IntegralImage {
    sum: Array2<f64>,
    sum_sq: Array2<f64>,
}

impl IntegralImage {
    fn new(image: &RgbImage, channel: usize) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let mut sum = Array2::<f64>::zeros((height + 1, width + 1));
        let mut sum_sq = Array2::<f64>::zeros((height + 1, width + 1));
        for y in 0..height {
            let mut row_sum = 0.0;
            let mut row_sum_sq = 0.0;
            for x in 0..width {
                let v = f64::from(image.get_pixel(x as u32, y as u32).0[channel]);
                row_sum += v;
                row_sum_sq += v * v;
                sum[(y + 1, x + 1)] = sum[(y, x + 1)] + row_sum;
                sum_sq[(y + 1, x + 1)] = sum_sq[(y, x + 1)] + row_sum_sq;
            }
        }
        Self { sum, sum_sq }
    }

    fn window(table: &Array2<f64>, x: usize, y: usize, w: usize, h: usize) -> f64 {
        table[(y + h, x + w)] - table[(y, x + w)] - table[(y + h, x)] + table[(y, x)]
    }

    /// Sum and sum of squares of a window
    fn window_stats(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        (
            Self::window(&self.sum, x, y, w, h),
            Self::window(&self.sum_sq, x, y, w, h),
        )
    }
}

/// Zero-mean template, flattened as `(dx, dy, [channel values])`
struct CenteredTemplate {
    pixels: Vec<(usize, usize, [f64; CHANNELS])>,
    norm_sq: f64,
    width: usize,
    height: usize,
}

impl CenteredTemplate {
    fn new(template: &RgbImage) -> Self {
        let count = f64::from(template.width() * template.height());
        let mut means = [0.0; CHANNELS];
        for pixel in template.pixels() {
            for (mean, &v) in means.iter_mut().zip(pixel.0.iter()) {
                *mean += f64::from(v) / count;
            }
        }

        let mut norm_sq = 0.0;
        let pixels = template
            .enumerate_pixels()
            .map(|(x, y, pixel)| {
                let mut centered = [0.0; CHANNELS];
                for ((c, &v), mean) in centered.iter_mut().zip(pixel.0.iter()).zip(means) {
                    *c = f64::from(v) - mean;
                    norm_sq += *c * *c;
                }
                (x as usize, y as usize, centered)
            })
            .collect();

        Self {
            pixels,
            norm_sq,
            width: template.width() as usize,
            height: template.height() as usize,
        }
    }
}

/// Correlation score of the template placed with its top-left at `(x, y)`
fn score_at(
    image: &RgbImage,
    integrals: &[IntegralImage; CHANNELS],
    template: &CenteredTemplate,
    x: usize,
    y: usize,
) -> f64 {
    let count = (template.width * template.height) as f64;
    let window_variance: f64 = integrals
        .iter()
        .map(|integral| {
            let (sum, sum_sq) = integral.window_stats(x, y, template.width, template.height);
            (sum_sq - sum * sum / count).max(0.0)
        })
        .sum();

    let denominator = (template.norm_sq * window_variance).sqrt();
    if template.norm_sq < FLAT_VARIANCE || window_variance < FLAT_VARIANCE {
        return 0.0;
    }

    // Template is zero-mean, so correlating against raw window values
    // equals correlating against the zero-mean window
    let numerator: f64 = template
        .pixels
        .iter()
        .map(|&(dx, dy, centered)| {
            let pixel = image.get_pixel((x + dx) as u32, (y + dy) as u32);
            centered
                .iter()
                .zip(pixel.0.iter())
                .map(|(t, &v)| t * f64::from(v))
                .sum::<f64>()
        })
        .sum();

    (numerator / denominator).clamp(-1.0, 1.0)
}

/// Locate the window of `image` that best correlates with `template`
///
/// Every placement where the template fits entirely inside the image is
/// scored. Ties resolve to the first position in row-major order, so the
/// search is deterministic even though rows are scored in parallel.
///
/// # Errors
///
/// Returns an error if the template is empty or larger than the image
pub fn match_template(image: &RgbImage, template: &RgbImage) -> Result<TemplateMatch> {
    if template.width() == 0 || template.height() == 0 {
        return Err(invalid_parameter(
            "template",
            &format!("{}x{}", template.width(), template.height()),
            &"template must not be empty",
        ));
    }
    if template.width() > image.width() || template.height() > image.height() {
        return Err(invalid_parameter(
            "template",
            &format!("{}x{}", template.width(), template.height()),
            &format!(
                "template does not fit inside {}x{} image",
                image.width(),
                image.height()
            ),
        ));
    }

    let integrals = [
        IntegralImage::new(image, 0),
        IntegralImage::new(image, 1),
        IntegralImage::new(image, 2),
    ];
    let centered = CenteredTemplate::new(template);
    let positions_x = (image.width() - template.width()) as usize + 1;
    let positions_y = (image.height() - template.height()) as usize + 1;

    let row_bests: Vec<(usize, f64)> = (0..positions_y)
        .into_par_iter()
        .map(|y| {
            (0..positions_x)
                .map(|x| (x, score_at(image, &integrals, &centered, x, y)))
                .fold((0, f64::NEG_INFINITY), |best, candidate| {
                    if candidate.1 > best.1 { candidate } else { best }
                })
        })
        .collect();

    let (y, (x, score)) = row_bests
        .into_iter()
        .enumerate()
        .fold((0, (0, f64::NEG_INFINITY)), |best, candidate| {
            if candidate.1.1 > best.1.1 { candidate } else { best }
        });

    Ok(TemplateMatch {
        x: x as u32,
        y: y as u32,
        score,
    })
}
