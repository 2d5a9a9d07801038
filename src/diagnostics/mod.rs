//! Serializable run diagnostics.
//!
//! Every processed frame yields a [`FrameReport`] with stage timings, solver
//! statistics, flow statistics and the recoverable warnings it raised. A run
//! collects them into a [`RunReport`], which the demo binary writes as JSON.

pub mod report;
pub mod timing;

pub use report::{FlowReport, FrameReport, RunReport, SolverSummary};
pub use timing::{StageTiming, TimingBreakdown};
