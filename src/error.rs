//! Error taxonomy for the regularizer.
//!
//! [`RegularizeError`] covers every fatal condition raised by a component.
//! The pipeline wraps it into [`PipelineError`] with the frame index and the
//! stage that failed. Recoverable per-frame conditions are not errors; they
//! are reported as [`FrameWarning`]s and the run continues.
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegularizeError {
    /// Two inputs that must share a spatial size do not.
    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// A raw buffer does not hold `w × h` samples.
    #[error("buffer holds {actual} samples, image size requires {expected}")]
    BufferLength { expected: usize, actual: usize },
    /// A row of the assembled system has no data, temporal or smoothness
    /// coupling, so the solution is not unique.
    #[error("singular system: pixel {pixel} has a zero diagonal")]
    SingularSystem { pixel: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read frame {frame}: {reason}")]
    FrameRead { frame: usize, reason: String },
    #[error("failed to write frame {frame}: {reason}")]
    FrameWrite { frame: usize, reason: String },
    #[error("{}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },
    /// The pipeline reached `Done` or `Failed`; `reset()` it first.
    #[error("pipeline is {state}; reset it before processing more frames")]
    PipelineFinished { state: &'static str },
}

/// Pipeline stage in which a fatal error occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    /// State check before any work on the frame.
    Start,
    Read,
    Geometry,
    Flow,
    Warp,
    Weights,
    Assemble,
    Solve,
    Refine,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Read => "read",
            Stage::Geometry => "geometry",
            Stage::Flow => "flow",
            Stage::Warp => "warp",
            Stage::Weights => "weights",
            Stage::Assemble => "assemble",
            Stage::Solve => "solve",
            Stage::Refine => "refine",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// Fatal error that aborted a pipeline run.
#[derive(Debug, Error)]
#[error("frame {frame} failed during {stage}: {source}")]
pub struct PipelineError {
    pub frame: usize,
    pub stage: Stage,
    #[source]
    pub source: RegularizeError,
}

impl PipelineError {
    pub fn new(frame: usize, stage: Stage, source: RegularizeError) -> Self {
        Self {
            frame,
            stage,
            source,
        }
    }
}

/// Recoverable per-frame condition. Logged and recorded; the run continues.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum FrameWarning {
    /// The iteration cap was hit before the tolerance; the best iterate was used.
    #[serde(rename_all = "camelCase")]
    SolverDidNotConverge {
        iterations: usize,
        relative_residual: f64,
    },
    /// Too little texture for reliable flow; a zero flow field was used.
    #[serde(rename_all = "camelCase")]
    InsufficientTexture { textured_fraction: f32 },
}

impl fmt::Display for FrameWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameWarning::SolverDidNotConverge {
                iterations,
                relative_residual,
            } => write!(
                f,
                "solver did not converge after {iterations} iterations (relative residual {relative_residual:.3e})"
            ),
            FrameWarning::InsufficientTexture { textured_fraction } => write!(
                f,
                "insufficient texture for optical flow ({:.1}% textured), using zero flow",
                textured_fraction * 100.0
            ),
        }
    }
}
