//! Corner keypoints and colour-patch descriptors for screenshot matching

use image::RgbImage;
use ndarray::Array2;

use crate::io::configuration::{
    DESCRIPTOR_RADIUS, HARRIS_K, HARRIS_RELATIVE_THRESHOLD, HARRIS_WINDOW_RADIUS,
    KEYPOINT_SUPPRESSION_RADIUS, MATCH_DISTINCTNESS, MAX_KEYPOINTS, MIN_DESCRIPTOR_SCORE,
};

/// Corner location in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Column
    pub x: usize,
    /// Row
    pub y: usize,
    /// Harris corner response
    pub response: f64,
}

/// Keypoint with its zero-mean, unit-norm colour patch
#[derive(Debug, Clone)]
pub struct Feature {
    /// Where the patch is centred
    pub keypoint: Keypoint,
    descriptor: Vec<f64>,
}

impl Feature {
    /// Normalised correlation between two descriptors
    pub fn similarity(&self, other: &Self) -> f64 {
        self.descriptor
            .iter()
            .zip(other.descriptor.iter())
            .map(|(a, b)| a * b)
            .sum()
    }
}

/// Correspondence between a query feature and a train feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureMatch {
    /// Index into the query feature list
    pub query: usize,
    /// Index into the train feature list
    pub train: usize,
    /// Descriptor similarity
    pub score: f64,
}

/// Harris corner detector with patch descriptors
#[derive(Debug, Clone, Copy)]
pub struct FeatureDetector {
    /// Harris sensitivity constant
    pub harris_k: f64,
    /// Structure tensor window radius
    pub window_radius: usize,
    /// Responses below this fraction of the maximum are ignored
    pub relative_threshold: f64,
    /// Keypoints must be the strongest response within this radius
    pub suppression_radius: usize,
    /// Maximum keypoints kept, strongest first
    pub max_keypoints: usize,
    /// Descriptor patch radius
    pub descriptor_radius: usize,
}

impl Default for FeatureDetector {
    fn default() -> Self {
        Self {
            harris_k: HARRIS_K,
            window_radius: HARRIS_WINDOW_RADIUS,
            relative_threshold: HARRIS_RELATIVE_THRESHOLD,
            suppression_radius: KEYPOINT_SUPPRESSION_RADIUS,
            max_keypoints: MAX_KEYPOINTS,
            descriptor_radius: DESCRIPTOR_RADIUS,
        }
    }
}

fn luminance(image: &RgbImage) -> Array2<f64> {
    Array2::from_shape_fn(
        (image.height() as usize, image.width() as usize),
        |(y, x)| {
            let [r, g, b] = image.get_pixel(x as u32, y as u32).0;
            0.114f64.mul_add(
                f64::from(b),
                0.299f64.mul_add(f64::from(r), 0.587 * f64::from(g)),
            )
        },
    )
}

impl FeatureDetector {
    /// Pixels closer than this to the border carry no keypoints
    const fn margin(&self) -> usize {
        let harris = self.window_radius + 1;
        let patch = self.descriptor_radius;
        (if harris > patch { harris } else { patch }) + 1
    }

    /// Harris response for every pixel; zero inside the border margin
    fn corner_response(&self, gray: &Array2<f64>) -> Array2<f64> {
        let (height, width) = gray.dim();
        let mut ixx = Array2::<f64>::zeros((height, width));
        let mut iyy = Array2::<f64>::zeros((height, width));
        let mut ixy = Array2::<f64>::zeros((height, width));

        // Sobel gradients
        for y in 1..height.saturating_sub(1) {
            for x in 1..width.saturating_sub(1) {
                let p = |dy: isize, dx: isize| {
                    gray[(
                        y.wrapping_add_signed(dy),
                        x.wrapping_add_signed(dx),
                    )]
                };
                let gx = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
                let gy = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
                ixx[(y, x)] = gx * gx;
                iyy[(y, x)] = gy * gy;
                ixy[(y, x)] = gx * gy;
            }
        }

        let margin = self.margin();
        let r = self.window_radius;
        let mut response = Array2::<f64>::zeros((height, width));
        for y in margin..height.saturating_sub(margin) {
            for x in margin..width.saturating_sub(margin) {
                let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
                for wy in y - r..=y + r {
                    for wx in x - r..=x + r {
                        sxx += ixx[(wy, wx)];
                        syy += iyy[(wy, wx)];
                        sxy += ixy[(wy, wx)];
                    }
                }
                let det = sxx.mul_add(syy, -(sxy * sxy));
                let trace = sxx + syy;
                response[(y, x)] = (-self.harris_k * trace).mul_add(trace, det);
            }
        }
        response
    }

    /// Keypoints that dominate their suppression neighbourhood
    ///
    /// Equal responses are broken by row-major position so that the same
    /// image content yields the same keypoints regardless of where it sits.
    pub fn keypoints(&self, image: &RgbImage) -> Vec<Keypoint> {
        let response = self.corner_response(&luminance(image));
        let (height, width) = response.dim();
        let strongest = response.iter().copied().fold(0.0, f64::max);
        if strongest <= 0.0 {
            return Vec::new();
        }
        let threshold = strongest * self.relative_threshold;
        let s = self.suppression_radius as isize;

        let mut keypoints = Vec::new();
        for ((y, x), &value) in response.indexed_iter() {
            if value <= threshold {
                continue;
            }
            let dominated = (-s..=s).any(|dy| {
                (-s..=s).any(|dx| {
                    if dy == 0 && dx == 0 {
                        return false;
                    }
                    let (Some(ny), Some(nx)) = (y.checked_add_signed(dy), x.checked_add_signed(dx))
                    else {
                        return false;
                    };
                    if ny >= height || nx >= width {
                        return false;
                    }
                    let other = response[(ny, nx)];
                    other > value || (other == value && (ny, nx) < (y, x))
                })
            });
            if !dominated {
                keypoints.push(Keypoint { x, y, response: value });
            }
        }

        keypoints.sort_by(|a, b| {
            b.response
                .total_cmp(&a.response)
                .then((a.y, a.x).cmp(&(b.y, b.x)))
        });
        keypoints.truncate(self.max_keypoints);
        keypoints
    }

    /// Detect keypoints and describe each with its normalised colour patch
    ///
    /// Keypoints whose patch has no variance are dropped.
    pub fn detect(&self, image: &RgbImage) -> Vec<Feature> {
        let r = self.descriptor_radius;
        self.keypoints(image)
            .into_iter()
            .filter_map(|keypoint| {
                let mut descriptor = Vec::with_capacity((2 * r + 1).pow(2) * 3);
                for y in keypoint.y - r..=keypoint.y + r {
                    for x in keypoint.x - r..=keypoint.x + r {
                        let pixel = image.get_pixel(x as u32, y as u32);
                        descriptor.extend(pixel.0.iter().map(|&v| f64::from(v)));
                    }
                }
                let mean = descriptor.iter().sum::<f64>() / descriptor.len() as f64;
                descriptor.iter_mut().for_each(|v| *v -= mean);
                let norm = descriptor.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm < f64::EPSILON {
                    return None;
                }
                descriptor.iter_mut().for_each(|v| *v /= norm);
                Some(Feature {
                    keypoint,
                    descriptor,
                })
            })
            .collect()
    }
}

/// Match every query feature to its most similar train feature
///
/// A match is kept when its similarity reaches [`MIN_DESCRIPTOR_SCORE`] and
/// beats the runner-up by at least [`MATCH_DISTINCTNESS`], which rejects
/// keypoints on repeating texture.
pub fn match_features(query: &[Feature], train: &[Feature]) -> Vec<FeatureMatch> {
    query
        .iter()
        .enumerate()
        .filter_map(|(qi, q)| {
            let mut best: Option<(usize, f64)> = None;
            let mut second = f64::NEG_INFINITY;
            for (ti, t) in train.iter().enumerate() {
                let score = q.similarity(t);
                match best {
                    Some((_, best_score)) if score <= best_score => second = second.max(score),
                    Some((_, best_score)) => {
                        second = best_score;
                        best = Some((ti, score));
                    }
                    None => best = Some((ti, score)),
                }
            }
            let (train_index, score) = best?;
            (score >= MIN_DESCRIPTOR_SCORE && score - second >= MATCH_DISTINCTNESS).then_some(
                FeatureMatch {
                    query: qi,
                    train: train_index,
                    score,
                },
            )
        })
        .collect()
}
