use super::{ensure, positive};
use crate::error::RegularizeError;
use serde::{Deserialize, Serialize};

/// Robust function mapping edge strength to a `[0, 1]` weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EdgeWeightShape {
    /// Tukey biweight `(1 − (e/c)²)²` for `e ≤ c`, zero beyond the cutoff.
    Tukey { cutoff: f32 },
    /// Negative exponential `exp(−e/σ)`.
    Exponential { sigma: f32 },
}

impl Default for EdgeWeightShape {
    fn default() -> Self {
        EdgeWeightShape::Tukey { cutoff: 4.685 }
    }
}

/// Options controlling the weight field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightOptions {
    /// Factor applied to the depth gradient before `exp(−·)` for the
    /// smoothness weights. Large values make depth edges block smoothing.
    pub smoothness_gradient_scale: f32,
    /// Factor applied to the depth gradient before `exp(−·)` for the data
    /// confidence.
    pub data_gradient_scale: f32,
    /// Median window applied to the data confidence.
    pub data_median_window: usize,
    /// Robust function applied to the combined edge map.
    pub edge_weight: EdgeWeightShape,
    /// Box window averaging the robust edge weight.
    pub robust_window: usize,
}

impl Default for WeightOptions {
    fn default() -> Self {
        Self {
            smoothness_gradient_scale: 1e3,
            data_gradient_scale: 5.0,
            data_median_window: 3,
            edge_weight: EdgeWeightShape::default(),
            robust_window: 3,
        }
    }
}

impl WeightOptions {
    pub fn validate(&self) -> Result<(), RegularizeError> {
        super::non_negative("smoothness_gradient_scale", self.smoothness_gradient_scale)?;
        super::non_negative("data_gradient_scale", self.data_gradient_scale)?;
        match self.edge_weight {
            EdgeWeightShape::Tukey { cutoff } => positive("tukey cutoff", cutoff)?,
            EdgeWeightShape::Exponential { sigma } => positive("exponential sigma", sigma)?,
        }
        ensure(self.robust_window <= 31 && self.data_median_window <= 31, || {
            "weight windows must not exceed 31 pixels".to_string()
        })
    }
}
