//! Per-frame weight field.
//!
//! From the RGB frame and the raw depth this computes
//! - an edge map combining luminance and depth edges,
//! - a data confidence that drops where the depth changes fast,
//! - a smoothness field and its eight directional neighbor weights,
//! - a robust weight of the edge map that scales the temporal term.
//!
//! Every map lies in `[0, 1]` and is recomputed for each frame.

pub mod neighbors;
pub mod robust;

pub use neighbors::{Direction, NeighborWeights};
pub use robust::{robust_weight, robust_weight_map};

use crate::config::WeightOptions;
use crate::edges::{detect_edges, median_filter, sobel_magnitude};
use crate::error::RegularizeError;
use crate::image::{ImageF32, ImageRgbF32};
use log::debug;

const EDGE_EPS: f32 = 1e-10;

#[derive(Clone, Debug)]
pub struct WeightMaps {
    /// Combined luminance and depth edge strength.
    pub edge: ImageF32,
    /// Confidence in the observed depth, scales the data term.
    pub data: ImageF32,
    /// `exp(−k·|∇depth|)`; the source of the neighbor weights.
    pub smoothness: ImageF32,
    pub neighbors: NeighborWeights,
    /// Edge map through the robust function, scales the temporal term.
    pub robust: ImageF32,
}

impl WeightMaps {
    pub fn dims(&self) -> (usize, usize) {
        self.data.dims()
    }
}

/// Compute all weight maps for one frame.
pub fn compute_weight_maps(
    rgb: &ImageRgbF32,
    depth: &ImageF32,
    options: &WeightOptions,
) -> Result<WeightMaps, RegularizeError> {
    if rgb.dims() != depth.dims() {
        return Err(RegularizeError::ShapeMismatch {
            context: "weight maps (rgb vs depth)",
            expected: depth.dims(),
            actual: rgb.dims(),
        });
    }

    let edge = combined_edge_map(&rgb.luminance(), depth);
    let depth_grad = sobel_magnitude(depth);

    let data_scale = options.data_gradient_scale;
    let data_raw = depth_grad.map(|g| (-data_scale * g).exp());
    let data = median_filter(&data_raw, options.data_median_window);

    let sm_scale = options.smoothness_gradient_scale;
    let smoothness = depth_grad.map(|g| (-sm_scale * g).exp());
    let neighbors = NeighborWeights::from_smoothness(&smoothness);

    let robust = robust_weight_map(&edge, options.edge_weight, options.robust_window);

    debug!(
        "weights: {}x{} edge max {:.3}, mean data {:.3}, mean robust {:.3}",
        depth.w,
        depth.h,
        edge.max_value(),
        mean(&data),
        mean(&robust)
    );

    Ok(WeightMaps {
        edge,
        data,
        smoothness,
        neighbors,
        robust,
    })
}

/// Sum of the normalised luminance and depth edge maps, rescaled by its peak.
pub fn combined_edge_map(luma: &ImageF32, depth: &ImageF32) -> ImageF32 {
    let e_luma = detect_edges(luma);
    let e_depth = detect_edges(depth);
    let mut sum = e_luma;
    for (s, d) in sum.data.iter_mut().zip(&e_depth.data) {
        *s += d;
    }
    let denom = sum.max_value() + EDGE_EPS;
    sum.map(|v| v / denom)
}

fn mean(img: &ImageF32) -> f32 {
    if img.data.is_empty() {
        return 0.0;
    }
    img.data.iter().sum::<f32>() / img.data.len() as f32
}
