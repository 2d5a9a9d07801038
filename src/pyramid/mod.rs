//! Grayscale image pyramid with separable blur and fractional downscaling.
//!
//! Level 0 is the input. Each further level blurs the previous one with the
//! configured separable filter and resamples it by `ratio` (bilinear,
//! pixel-centre aligned). Construction stops when the next level would be
//! narrower or shorter than `min_width`, or at `max_levels`.
//!
//! Used by the coarse-to-fine optical flow estimator; levels are ordered
//! fine → coarse.

pub mod filters;
pub mod options;

pub use options::PyramidOptions;

use crate::image::resize::resize_bilinear;
use crate::image::ImageF32;
use filters::apply_separable;

#[derive(Clone, Debug, Default)]
pub struct Pyramid {
    pub levels: Vec<ImageF32>,
}

impl Pyramid {
    pub fn build(image: &ImageF32, options: PyramidOptions) -> Self {
        let mut levels = vec![image.clone()];
        let ratio = options.ratio.clamp(0.05, 0.98);
        let min_side = options.min_width.max(1);
        while levels.len() < options.max_levels.max(1) {
            let Some(prev) = levels.last() else {
                break;
            };
            let nw = (prev.w as f32 * ratio).round() as usize;
            let nh = (prev.h as f32 * ratio).round() as usize;
            if nw < min_side || nh < min_side || (nw, nh) == prev.dims() {
                break;
            }
            let blurred = apply_separable(&options.filter, prev);
            levels.push(resize_bilinear(&blurred, nw, nh));
        }
        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn coarsest(&self) -> Option<&ImageF32> {
        self.levels.last()
    }
}
