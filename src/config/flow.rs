use super::{ensure, non_negative};
use crate::error::RegularizeError;
use serde::{Deserialize, Serialize};

/// Parameters of the coarse-to-fine dense flow estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowOptions {
    /// Size ratio between consecutive pyramid levels, in `(0, 1)`.
    pub ratio: f32,
    /// Width (and height) below which no coarser level is built.
    pub min_width: usize,
    /// Cap on the number of pyramid levels.
    pub max_levels: usize,
    /// Radius of the square correlation window around each pixel.
    pub window_radius: usize,
    /// Re-warps of the current frame per pyramid level.
    pub outer_iterations: usize,
    /// Residual refreshes per warp. The structure tensor is fixed per level.
    pub inner_iterations: usize,
    /// Minimum eigenvalue of the windowed structure tensor (mean of
    /// central-difference gradient products) for a pixel to count as
    /// textured and receive updates.
    pub min_eigenvalue: f32,
    /// Median window applied to the flow after every outer iteration and
    /// after upsampling to a finer level. `0` or `1` disables it.
    pub median_window: usize,
    /// Fraction of textured pixels below which the frame pair is treated as
    /// texture-less and a zero flow is returned.
    pub min_textured_fraction: f32,
    /// Largest per-iteration update (pixels) accepted at a level.
    pub max_step: f32,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            ratio: 0.75,
            min_width: 20,
            max_levels: 12,
            window_radius: 2,
            outer_iterations: 7,
            inner_iterations: 1,
            min_eigenvalue: 1e-4,
            median_window: 3,
            min_textured_fraction: 0.01,
            max_step: 2.0,
        }
    }
}

impl FlowOptions {
    pub fn validate(&self) -> Result<(), RegularizeError> {
        ensure(self.ratio > 0.0 && self.ratio < 1.0, || {
            format!("flow ratio must lie in (0, 1), got {}", self.ratio)
        })?;
        ensure(self.window_radius >= 1, || {
            "flow window_radius must be at least 1".to_string()
        })?;
        ensure(self.max_levels >= 1, || "flow max_levels must be at least 1".to_string())?;
        non_negative("flow min_eigenvalue", self.min_eigenvalue)?;
        ensure((0.0..=1.0).contains(&self.min_textured_fraction), || {
            format!(
                "flow min_textured_fraction must lie in [0, 1], got {}",
                self.min_textured_fraction
            )
        })?;
        super::positive("flow max_step", self.max_step)
    }
}
