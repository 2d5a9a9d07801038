//! Dense optical flow between consecutive frames.
//!
//! The estimator works on grayscale frames and returns, for every pixel of the
//! previous frame, the displacement to its location in the current frame. The
//! warper resamples a scalar field through such a displacement, and
//! [`visualize::flow_to_rgb`] renders one for debug dumps.

pub mod estimator;
pub mod visualize;
pub mod warp;

pub use estimator::FlowEstimator;
pub use visualize::flow_to_rgb;
pub use warp::warp_with_flow;

use crate::image::ImageF32;
use serde::Serialize;

/// Per-pixel displacement `(dx, dy)` in pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowField {
    pub dx: ImageF32,
    pub dy: ImageF32,
}

impl FlowField {
    pub fn zeros(w: usize, h: usize) -> Self {
        Self {
            dx: ImageF32::new(w, h),
            dy: ImageF32::new(w, h),
        }
    }

    /// Same displacement everywhere.
    pub fn uniform(w: usize, h: usize, dx: f32, dy: f32) -> Self {
        Self {
            dx: ImageF32::filled(w, h, dx),
            dy: ImageF32::filled(w, h, dy),
        }
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        self.dx.dims()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> (f32, f32) {
        (self.dx.get(x, y), self.dy.get(x, y))
    }

    pub fn magnitudes(&self) -> impl Iterator<Item = f32> + '_ {
        self.dx
            .data
            .iter()
            .zip(&self.dy.data)
            .map(|(u, v)| (u * u + v * v).sqrt())
    }

    pub fn stats(&self) -> FlowStats {
        let n = self.dx.data.len();
        if n == 0 {
            return FlowStats::default();
        }
        let (sum, max) = self
            .magnitudes()
            .fold((0.0f64, 0.0f32), |(s, m), v| (s + v as f64, m.max(v)));
        FlowStats {
            mean_magnitude: (sum / n as f64) as f32,
            max_magnitude: max,
        }
    }
}

/// Summary of a flow field for reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStats {
    pub mean_magnitude: f32,
    pub max_magnitude: f32,
}

/// Result of one flow estimation.
#[derive(Clone, Debug)]
pub struct FlowEstimate {
    pub field: FlowField,
    /// Fraction of finest-level pixels whose structure tensor passed the
    /// texture threshold.
    pub textured_fraction: f32,
    /// Set when the textured fraction fell below the configured minimum; the
    /// field is then all zeros.
    pub insufficient_texture: bool,
    /// Pyramid levels used.
    pub levels: usize,
}
