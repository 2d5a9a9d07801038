//! Edge processing utilities: gradients, histogram equalisation, median
//! filtering and the contrast-normalised edge detector used by the weight
//! field.
//!
//! Borders are handled by clamping indices (replicate) throughout.

pub mod equalize;
pub mod grad;
pub mod median;

pub use equalize::equalize_histogram;
pub use grad::{central_differences, sobel_gradients, sobel_magnitude, Grad};
pub use median::median_filter;

use crate::image::ImageF32;
use crate::pyramid::filters::{apply_separable, GAUSSIAN_3TAP};

const NORM_EPS: f32 = 1e-10;

/// Contrast-normalised edge strength of a single-channel image in `[0, 1]`.
///
/// Sobel magnitude → 3×3 Gaussian → peak rescale → histogram equalisation →
/// min–max normalisation. A flat input (no gradient anywhere) yields all zeros.
pub fn detect_edges(gray: &ImageF32) -> ImageF32 {
    let mag = sobel_magnitude(gray);
    if mag.max_value() <= NORM_EPS {
        return ImageF32::new(gray.w, gray.h);
    }
    let smoothed = apply_separable(&GAUSSIAN_3TAP, &mag);
    // Sobel responses exceed 1 on strong steps; rescale before quantising.
    let peak = smoothed.max_value().max(NORM_EPS);
    let equalized = equalize_histogram(&smoothed.map(|v| v / peak));
    let Some((lo, hi)) = equalized.min_max() else {
        return equalized;
    };
    let scale = 1.0 / (hi - lo + NORM_EPS);
    equalized.map(|v| ((v - lo) * scale).clamp(0.0, 1.0))
}
