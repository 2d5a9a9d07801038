use super::TimingBreakdown;
use crate::config::SolverMethod;
use crate::error::FrameWarning;
use crate::flow::FlowStats;
use serde::Serialize;

/// Solver outcome summary.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverSummary {
    pub method: SolverMethod,
    pub iterations: usize,
    pub relative_residual: f64,
    pub converged: bool,
}

/// Flow statistics for frames with a temporal term.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowReport {
    pub stats: FlowStats,
    pub textured_fraction: f32,
    pub insufficient_texture: bool,
    pub levels: usize,
}

/// Everything recorded about one processed frame.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub index: usize,
    /// Input resolution `[w, h]`.
    pub input_size: [usize; 2],
    /// Resolution the system was solved at.
    pub working_size: [usize; 2],
    pub temporal: bool,
    pub solver: SolverSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<FlowReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<FrameWarning>,
    pub timings: TimingBreakdown,
}

/// Summary of a whole run (or of the part that ran before cancellation).
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub frames: Vec<FrameReport>,
    pub total_ms: f64,
    pub cancelled: bool,
}

impl RunReport {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn warning_count(&self) -> usize {
        self.frames.iter().map(|f| f.warnings.len()).sum()
    }

    pub fn non_converged(&self) -> impl Iterator<Item = &FrameReport> {
        self.frames.iter().filter(|f| !f.solver.converged)
    }
}
