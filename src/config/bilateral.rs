use super::positive;
use crate::error::RegularizeError;
use serde::{Deserialize, Serialize};

/// Joint bilateral post-filter parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BilateralOptions {
    pub enabled: bool,
    /// Window radius in pixels (diameter `2r + 1`).
    pub radius: usize,
    /// Spatial Gaussian σ in pixels.
    pub sigma_space: f32,
    /// Range Gaussian σ on the guide luminance (`[0, 1]` units).
    pub sigma_range: f32,
}

impl Default for BilateralOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 4,
            sigma_space: 4.0,
            sigma_range: 0.1,
        }
    }
}

impl BilateralOptions {
    pub fn validate(&self) -> Result<(), RegularizeError> {
        positive("bilateral sigma_space", self.sigma_space)?;
        positive("bilateral sigma_range", self.sigma_range)
    }
}
