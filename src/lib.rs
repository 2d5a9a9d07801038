#![doc = include_str!("../README.md")]

// Public modules
pub mod bilateral;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod flow;
pub mod image;
pub mod pipeline;
pub mod solver;
pub mod system;
pub mod weights;

// Building blocks shared by the stages.
pub mod edges;
pub mod pyramid;

mod parallel;

// --- High-level re-exports -------------------------------------------------

pub use crate::config::{load_config, GeometryOptions, SolverConfig};
pub use crate::error::{FrameWarning, PipelineError, RegularizeError, Stage};
pub use crate::pipeline::{
    CancelToken, Frame, FrameSink, FrameSource, PipelineState, RegularizationPipeline,
};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use depth_regularizer::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (w, h) = (64usize, 32usize);
/// let frames = (0..3).map(|index| Frame {
///     index,
///     rgb: ImageRgbF32::new(w, h),
///     depth: ImageF32::filled(w, h, 0.5),
/// });
///
/// let mut pipeline = RegularizationPipeline::new(SolverConfig::default(), GeometryOptions::default())?;
/// let mut sink = CollectSink::default();
/// let report = pipeline.run(&mut IterSource::new(frames), &mut sink)?;
/// println!("frames={} warnings={}", report.frame_count(), report.warning_count());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ImageF32, ImageRgbF32};
    pub use crate::pipeline::{CollectSink, Frame, IterSource, RegularizationPipeline};
    pub use crate::{GeometryOptions, SolverConfig};
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    pub use crate::bilateral::joint_bilateral_filter;
    pub use crate::flow::{flow_to_rgb, warp_with_flow, FlowEstimate, FlowEstimator, FlowField};
    pub use crate::solver::{solve, SolveOutcome};
    pub use crate::system::{build_system, LinearSystem, SparseMatrix, TemporalTerm};
    pub use crate::weights::{compute_weight_maps, WeightMaps};

    pub use crate::diagnostics::{
        FlowReport, FrameReport, RunReport, SolverSummary, StageTiming, TimingBreakdown,
    };
}
