//! Sequential regularization of a frame stream.
//!
//! [`RegularizationPipeline`] folds over the frames of a [`FrameSource`],
//! carrying the refined depth and RGB of the previous frame in
//! [`PipelineState::SteadyState`]. Per frame:
//!
//! - geometry: pad and resize to working resolution,
//! - flow (prior RGB → current RGB) and warp of the prior depth,
//! - weight maps and system assembly, with a temporal anchor after frame 0,
//! - iterative solve, bilateral refinement, crop and output resize.
//!
//! Frames are strictly sequential; parallelism lives inside the stages.
//! Cancellation is checked between frames and leaves the carried state
//! untouched, so a later [`RegularizationPipeline::run`] resumes the stream.

pub mod geometry;
pub mod source;

pub use source::DirectoryFrameSource;

use crate::config::{GeometryOptions, SolverConfig};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{FlowReport, FrameReport, RunReport, SolverSummary, TimingBreakdown};
use crate::error::{FrameWarning, PipelineError, RegularizeError, Stage};
use crate::flow::{warp_with_flow, FlowEstimator, FlowField};
use crate::image::{ImageF32, ImageRgbF32};
use crate::solver::solve;
use crate::system::{build_system, TemporalTerm};
use crate::weights::{compute_weight_maps, WeightMaps};
use geometry::WorkingFrame;
use log::{debug, info, warn};
use nalgebra::DVector;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// One input frame.
#[derive(Clone, Debug)]
pub struct Frame {
    pub index: usize,
    pub rgb: ImageRgbF32,
    /// Raw depth in `[0, 1]`.
    pub depth: ImageF32,
}

/// State carried from one frame to the next, at working resolution.
#[derive(Clone, Debug)]
pub struct PriorFrame {
    pub depth: ImageF32,
    pub rgb: ImageRgbF32,
}

#[derive(Clone, Debug, Default)]
pub enum PipelineState {
    /// No frame processed yet; the next frame takes the first-frame path.
    #[default]
    Uninitialized,
    SteadyState(PriorFrame),
    /// The source is exhausted.
    Done,
    /// A fatal error aborted the run.
    Failed,
}

impl PipelineState {
    pub fn prior(&self) -> Option<&PriorFrame> {
        match self {
            PipelineState::SteadyState(prior) => Some(prior),
            _ => None,
        }
    }
}

/// Shared cancellation flag, checked at frame boundaries.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so a cancelled run can be resumed.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Supplies frames in order; `Ok(None)` ends the stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, RegularizeError>;
}

/// Adapts an iterator of frames into a [`FrameSource`].
#[derive(Debug)]
pub struct IterSource<I>(I);

impl<I: Iterator<Item = Frame>> IterSource<I> {
    pub fn new(frames: impl IntoIterator<IntoIter = I>) -> Self {
        Self(frames.into_iter())
    }
}

impl<I: Iterator<Item = Frame>> FrameSource for IterSource<I> {
    fn next_frame(&mut self) -> Result<Option<Frame>, RegularizeError> {
        Ok(self.0.next())
    }
}

/// Receives each regularized depth map.
pub trait FrameSink {
    fn consume(&mut self, index: usize, depth: &ImageF32) -> Result<(), RegularizeError>;
}

impl<F> FrameSink for F
where
    F: FnMut(usize, &ImageF32) -> Result<(), RegularizeError>,
{
    fn consume(&mut self, index: usize, depth: &ImageF32) -> Result<(), RegularizeError> {
        self(index, depth)
    }
}

/// Sink that keeps every output in memory.
#[derive(Clone, Debug, Default)]
pub struct CollectSink {
    pub frames: Vec<(usize, ImageF32)>,
}

impl FrameSink for CollectSink {
    fn consume(&mut self, index: usize, depth: &ImageF32) -> Result<(), RegularizeError> {
        self.frames.push((index, depth.clone()));
        Ok(())
    }
}

/// Intermediate maps of one frame, handed to a [`DebugHook`].
pub struct DebugArtifacts<'a> {
    pub weights: &'a WeightMaps,
    pub flow: Option<&'a FlowField>,
}

/// Callback receiving the intermediate maps of every frame.
pub type DebugHook =
    Box<dyn FnMut(usize, &DebugArtifacts<'_>) -> Result<(), RegularizeError> + Send>;

pub struct RegularizationPipeline {
    config: SolverConfig,
    geometry: GeometryOptions,
    flow: FlowEstimator,
    state: PipelineState,
    cancel: CancelToken,
    debug_hook: Option<DebugHook>,
}

impl RegularizationPipeline {
    /// Validate `config` and create a pipeline in the `Uninitialized` state.
    pub fn new(config: SolverConfig, geometry: GeometryOptions) -> Result<Self, RegularizeError> {
        config.validate()?;
        Ok(Self {
            flow: FlowEstimator::new(config.flow.clone()),
            config,
            geometry,
            state: PipelineState::Uninitialized,
            cancel: CancelToken::new(),
            debug_hook: None,
        })
    }

    /// Install a callback that receives the weight maps and flow of every
    /// frame. An error from the hook aborts the run like a sink error.
    pub fn with_debug_hook(mut self, hook: DebugHook) -> Self {
        self.debug_hook = Some(hook);
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Token that stops [`run`](Self::run) at the next frame boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Drop any carried state; the next frame is treated as the first.
    pub fn reset(&mut self) {
        self.state = PipelineState::Uninitialized;
    }

    /// Process frames until the source is exhausted, a fatal error occurs, or
    /// the cancel token is set.
    ///
    /// A run on a `Done` or `Failed` pipeline processes nothing; call
    /// [`reset`](Self::reset) first.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
    ) -> Result<RunReport, PipelineError> {
        let start = Instant::now();
        let mut report = RunReport::default();
        if matches!(self.state, PipelineState::Done | PipelineState::Failed) {
            warn!("pipeline already finished; reset it to process a new stream");
            return Ok(report);
        }

        loop {
            if self.cancel.is_cancelled() {
                info!("run cancelled after {} frames", report.frames.len());
                report.cancelled = true;
                break;
            }
            let next_index = report.frames.last().map_or(0, |f| f.index + 1);
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.state = PipelineState::Done;
                    break;
                }
                Err(e) => {
                    self.state = PipelineState::Failed;
                    let frame = match &e {
                        RegularizeError::FrameRead { frame, .. } => *frame,
                        _ => next_index,
                    };
                    return Err(PipelineError::new(frame, Stage::Read, e));
                }
            };

            let (depth, frame_report) = self.process_frame(&frame)?;
            let write_start = Instant::now();
            if let Err(e) = sink.consume(frame.index, &depth) {
                self.state = PipelineState::Failed;
                return Err(PipelineError::new(frame.index, Stage::Write, e));
            }
            let mut frame_report = frame_report;
            frame_report.timings.push(Stage::Write.to_string(), elapsed_ms(write_start));
            report.frames.push(frame_report);
        }

        report.total_ms = elapsed_ms(start);
        info!(
            "processed {} frames in {:.1} ms ({} warnings)",
            report.frame_count(),
            report.total_ms,
            report.warning_count()
        );
        Ok(report)
    }

    /// Regularize one frame and advance the carried state.
    ///
    /// In `SteadyState` the frame is coupled to the carried prior; from
    /// `Uninitialized` it takes the first-frame path. A `Done` or `Failed`
    /// pipeline rejects the frame with [`RegularizeError::PipelineFinished`]
    /// and keeps its state. On any other error the state becomes `Failed`.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<(ImageF32, FrameReport), PipelineError> {
        let start = Instant::now();
        let finished = match self.state {
            PipelineState::Done => Some("done"),
            PipelineState::Failed => Some("failed"),
            PipelineState::Uninitialized | PipelineState::SteadyState(_) => None,
        };
        if let Some(state) = finished {
            return Err(PipelineError::new(
                frame.index,
                Stage::Start,
                RegularizeError::PipelineFinished { state },
            ));
        }
        let prior = match std::mem::replace(&mut self.state, PipelineState::Failed) {
            PipelineState::SteadyState(prior) => Some(prior),
            _ => None,
        };

        let mut timings = TimingBreakdown::default();
        let working = timings
            .time(Stage::Geometry, || geometry::prepare(frame, &self.geometry))
            .map_err(|e| PipelineError::new(frame.index, Stage::Geometry, e))?;

        let solved = self.solve_frame(frame.index, &working, prior.as_ref(), &mut timings)?;

        let finished = timings
            .time(Stage::Refine, || {
                geometry::finish(
                    &solved.depth,
                    &working,
                    &self.geometry,
                    &self.config.bilateral,
                )
            })
            .map_err(|e| PipelineError::new(frame.index, Stage::Refine, e))?;

        if let Some(hook) = self.debug_hook.as_mut() {
            let artifacts = DebugArtifacts {
                weights: &solved.weights,
                flow: solved.flow_field.as_ref(),
            };
            hook(frame.index, &artifacts).map_err(stage_error(frame.index, Stage::Write))?;
        }

        for warning in &solved.warnings {
            warn!("frame {}: {warning}", frame.index);
        }
        timings.total_ms = elapsed_ms(start);
        info!(
            "frame {}: {} iterations, residual {:.2e}, {:.1} ms",
            frame.index, solved.solver.iterations, solved.solver.relative_residual, timings.total_ms
        );

        let (iw, ih) = working.input_size;
        let (ww, wh) = working.working_size();
        let report = FrameReport {
            index: frame.index,
            input_size: [iw, ih],
            working_size: [ww, wh],
            temporal: prior.is_some(),
            solver: solved.solver,
            flow: solved.flow,
            warnings: solved.warnings,
            timings,
        };

        self.state = PipelineState::SteadyState(PriorFrame {
            depth: finished.prior,
            rgb: working.rgb,
        });
        Ok((finished.output, report))
    }

    /// Flow, warp, weights, assembly and solve at working resolution.
    fn solve_frame(
        &self,
        index: usize,
        working: &WorkingFrame,
        prior: Option<&PriorFrame>,
        timings: &mut TimingBreakdown,
    ) -> Result<SolvedFrame, PipelineError> {
        let fail = |stage: Stage| stage_error(index, stage);
        let mut warnings = Vec::new();

        let (warped, flow, flow_field) = match prior {
            None => {
                debug!("frame {index}: first frame, no temporal term");
                (None, None, None)
            }
            Some(prior) => {
                let estimate = timings
                    .time(Stage::Flow, || {
                        self.flow
                            .estimate(&prior.rgb.luminance(), &working.rgb.luminance())
                    })
                    .map_err(fail(Stage::Flow))?;
                if estimate.insufficient_texture {
                    warnings.push(FrameWarning::InsufficientTexture {
                        textured_fraction: estimate.textured_fraction,
                    });
                }
                let warped = timings
                    .time(Stage::Warp, || warp_with_flow(&prior.depth, &estimate.field))
                    .map_err(fail(Stage::Warp))?;
                let flow = FlowReport {
                    stats: estimate.field.stats(),
                    textured_fraction: estimate.textured_fraction,
                    insufficient_texture: estimate.insufficient_texture,
                    levels: estimate.levels,
                };
                (Some(warped), Some(flow), Some(estimate.field))
            }
        };

        let weights = timings
            .time(Stage::Weights, || {
                compute_weight_maps(&working.rgb, &working.depth, &self.config.weights)
            })
            .map_err(fail(Stage::Weights))?;

        let temporal = match &warped {
            Some(warped_prior) => TemporalTerm::Anchor { warped_prior },
            None => TemporalTerm::None,
        };
        let system = timings
            .time(Stage::Assemble, || {
                build_system(&weights, &working.depth, &self.config, temporal)
            })
            .map_err(fail(Stage::Assemble))?;

        let guess = DVector::from_iterator(
            working.depth.data.len(),
            working.depth.data.iter().map(|&v| v as f64),
        );
        let outcome = timings.time(Stage::Solve, || solve(&system, &self.config, Some(&guess)));
        if !outcome.converged {
            warnings.push(FrameWarning::SolverDidNotConverge {
                iterations: outcome.iterations,
                relative_residual: outcome.relative_residual,
            });
        }
        let mut depth = system
            .to_image(&outcome.solution)
            .map_err(fail(Stage::Solve))?;
        depth.clip01();

        Ok(SolvedFrame {
            depth,
            solver: SolverSummary {
                method: self.config.method,
                iterations: outcome.iterations,
                relative_residual: outcome.relative_residual,
                converged: outcome.converged,
            },
            flow,
            warnings,
            weights,
            flow_field,
        })
    }
}

fn stage_error(index: usize, stage: Stage) -> impl Fn(RegularizeError) -> PipelineError {
    move |e| PipelineError::new(index, stage, e)
}

struct SolvedFrame {
    depth: ImageF32,
    solver: SolverSummary,
    flow: Option<FlowReport>,
    warnings: Vec<FrameWarning>,
    weights: WeightMaps,
    flow_field: Option<FlowField>,
}
