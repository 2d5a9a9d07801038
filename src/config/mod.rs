//! Run configuration.
//!
//! [`SolverConfig`] is the single immutable value threaded through every
//! component for a whole video; nothing reads process-wide state. All structs
//! deserialize from JSON with per-field defaults, so a config file only needs
//! the knobs it changes.

pub mod bilateral;
pub mod flow;
pub mod frames;
pub mod geometry;
pub mod weights;

pub use bilateral::BilateralOptions;
pub use flow::FlowOptions;
pub use frames::RegularizeFramesConfig;
pub use geometry::{GeometryOptions, HalfFrame};
pub use weights::{EdgeWeightShape, WeightOptions};

use crate::error::RegularizeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Iterative method used for the sparse solve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethod {
    /// Preconditioned conjugate gradient (symmetric positive-definite systems).
    ConjugateGradient,
    /// Preconditioned BiCGSTAB (tolerates mildly non-symmetric systems).
    #[default]
    BiCgStab,
}

/// Preconditioner applied inside the iterative solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preconditioner {
    None,
    /// Diagonal scaling by `1 / A_ii`.
    #[default]
    Jacobi,
}

/// How the temporal weight γ is distributed over the pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalWeighting {
    /// `γ_p = γ` everywhere.
    #[default]
    Uniform,
    /// `γ_p = γ · robust_p`: the warped prior is trusted less near edges.
    EdgeAware,
}

/// Parameters of the depth regularization energy and its solve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Data-term weight λ (pull toward the raw depth). Must be positive for a
    /// well-posed system.
    pub lambda_data: f32,
    /// Temporal-term weight γ (pull toward the warped previous depth).
    pub gamma: f32,
    /// Per-pixel distribution of γ.
    pub temporal_weighting: TemporalWeighting,
    /// Global smoothness scale `s` applied to the weighted Laplacian.
    pub smoothness: f32,
    /// Relative residual `‖b − Ax‖ / ‖b‖` at which the solve stops.
    pub tolerance: f64,
    /// Iteration cap for the solve.
    pub max_iterations: usize,
    pub method: SolverMethod,
    pub preconditioner: Preconditioner,
    /// Weight-map construction.
    pub weights: WeightOptions,
    /// Optical flow estimation.
    pub flow: FlowOptions,
    /// Bilateral post-filter.
    pub bilateral: BilateralOptions,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            lambda_data: 4e-2,
            gamma: 1e-2,
            temporal_weighting: TemporalWeighting::default(),
            smoothness: 1e-2,
            tolerance: 1e-6,
            max_iterations: 30,
            method: SolverMethod::default(),
            preconditioner: Preconditioner::default(),
            weights: WeightOptions::default(),
            flow: FlowOptions::default(),
            bilateral: BilateralOptions::default(),
        }
    }
}

pub(crate) fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<(), RegularizeError> {
    if cond {
        Ok(())
    } else {
        Err(RegularizeError::InvalidConfig(msg()))
    }
}

pub(crate) fn non_negative(name: &str, v: f32) -> Result<(), RegularizeError> {
    ensure(v.is_finite() && v >= 0.0, || {
        format!("{name} must be finite and non-negative, got {v}")
    })
}

pub(crate) fn positive(name: &str, v: f32) -> Result<(), RegularizeError> {
    ensure(v.is_finite() && v > 0.0, || {
        format!("{name} must be finite and positive, got {v}")
    })
}

impl SolverConfig {
    /// Reject values that cannot describe a valid run. A zero `lambda_data` is
    /// accepted here; it surfaces as a singular system only if some pixel also
    /// lacks temporal and smoothness coupling.
    pub fn validate(&self) -> Result<(), RegularizeError> {
        non_negative("lambda_data", self.lambda_data)?;
        non_negative("gamma", self.gamma)?;
        non_negative("smoothness", self.smoothness)?;
        ensure(self.tolerance.is_finite() && self.tolerance > 0.0, || {
            format!("tolerance must be positive, got {}", self.tolerance)
        })?;
        ensure(self.max_iterations >= 1, || {
            "max_iterations must be at least 1".to_string()
        })?;
        self.weights.validate()?;
        self.flow.validate()?;
        self.bilateral.validate()?;
        Ok(())
    }

    pub fn with_method(mut self, method: SolverMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Read a JSON file and deserialize it into `T`.
pub fn load_config<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, RegularizeError> {
    let data = fs::read_to_string(path).map_err(|e| RegularizeError::Io {
        path: path.to_path_buf(),
        reason: format!("failed to read config: {e}"),
    })?;
    serde_json::from_str(&data).map_err(|e| RegularizeError::Io {
        path: path.to_path_buf(),
        reason: format!("failed to parse config: {e}"),
    })
}
