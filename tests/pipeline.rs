mod common;

use common::init_logging;
use common::synthetic::{
    column_mean, column_variance, gray_frame, noisy_step_depth, ramp_depth, textured_frame,
    textured_rgb,
};
use depth_regularizer::config::{GeometryOptions, SolverConfig};
use depth_regularizer::error::{FrameWarning, RegularizeError, Stage};
use depth_regularizer::image::{ImageF32, ImageRgbF32};
use depth_regularizer::pipeline::{
    CollectSink, Frame, FrameSource, IterSource, PipelineState, RegularizationPipeline,
};
use depth_regularizer::stages::{
    build_system, compute_weight_maps, solve, warp_with_flow, FlowField, TemporalTerm,
};
use nalgebra::DVector;

fn pipeline(config: SolverConfig) -> RegularizationPipeline {
    RegularizationPipeline::new(config, GeometryOptions::default()).unwrap()
}

#[test]
fn frames_are_processed_in_order() {
    init_logging();
    let frames: Vec<Frame> = (0..3).map(|i| textured_frame(i, 24, 16)).collect();
    let mut p = pipeline(SolverConfig::default());
    let mut sink = CollectSink::default();
    let report = p.run(&mut IterSource::new(frames), &mut sink).unwrap();

    assert!(matches!(p.state(), PipelineState::Done));
    assert!(!report.cancelled);
    let indices: Vec<usize> = sink.frames.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert!(!report.frames[0].temporal);
    assert!(report.frames[0].flow.is_none());
    for f in &report.frames[1..] {
        assert!(f.temporal);
        let flow = f.flow.as_ref().unwrap();
        assert!(!flow.insufficient_texture);
        assert_eq!(flow.stats.max_magnitude, 0.0);
    }
    for (_, depth) in &sink.frames {
        assert_eq!(depth.dims(), (24, 16));
        assert!(depth.data.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

#[test]
fn flat_video_is_stable() {
    let frames: Vec<Frame> = (0..3)
        .map(|i| gray_frame(i, ImageF32::filled(10, 8, 0.37)))
        .collect();
    let mut p = pipeline(SolverConfig::default());
    let mut sink = CollectSink::default();
    let report = p.run(&mut IterSource::new(frames), &mut sink).unwrap();

    for (_, depth) in &sink.frames {
        assert!(depth.data.iter().all(|v| (v - 0.37).abs() < 1e-6));
    }
    for f in &report.frames[1..] {
        assert!(f
            .warnings
            .iter()
            .any(|w| matches!(w, FrameWarning::InsufficientTexture { .. })));
    }
}

#[test]
fn noisy_step_scenario() {
    let config = SolverConfig {
        lambda_data: 0.04,
        smoothness: 0.01,
        tolerance: 1e-6,
        max_iterations: 30,
        ..SolverConfig::default()
    };
    let noisy = noisy_step_depth(4, 4, 0.2, 0.8, 1e-4);
    let mut p = pipeline(config);
    let (out, report) = p.process_frame(&gray_frame(0, noisy.clone())).unwrap();

    assert!(report.solver.converged);
    assert!(report.warnings.is_empty());
    let step = column_mean(&out, 2, 4) - column_mean(&out, 0, 2);
    assert!(step >= 0.8 * 0.6, "step shrank to {step}");
    assert!(column_variance(&out, 0, 2) < column_variance(&noisy, 0, 2));
    assert!(column_variance(&out, 2, 4) < column_variance(&noisy, 2, 4));
    assert!(matches!(p.state(), PipelineState::SteadyState(_)));
}

#[test]
fn temporal_term_pulls_second_frame_toward_first() {
    let (w, h) = (20, 14);
    let base = ramp_depth(w, h);
    let shifted = base.map(|v| v + 0.1);
    let run = |gamma: f32| {
        let frames = vec![
            Frame {
                index: 0,
                rgb: textured_rgb(w, h),
                depth: base.clone(),
            },
            Frame {
                index: 1,
                rgb: textured_rgb(w, h),
                depth: shifted.clone(),
            },
        ];
        let mut p = pipeline(SolverConfig {
            gamma,
            ..SolverConfig::default()
        });
        let mut sink = CollectSink::default();
        p.run(&mut IterSource::new(frames), &mut sink).unwrap();
        let mean = |img: &ImageF32| column_mean(img, 0, w);
        mean(&sink.frames[1].1) - mean(&sink.frames[0].1)
    };
    let free = run(0.0);
    let anchored = run(0.5);
    assert!((free - 0.1).abs() < 0.02, "free shift {free}");
    assert!(anchored < 0.5 * free, "anchored shift {anchored}");
}

#[test]
fn cancellation_keeps_state_and_resumes() {
    let frames: Vec<Frame> = (0..4).map(|i| textured_frame(i, 16, 12)).collect();
    let mut source = IterSource::new(frames);
    let mut p = pipeline(SolverConfig::default());
    let token = p.cancel_token();

    token.cancel();
    let report = p.run(&mut source, &mut CollectSink::default()).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.frame_count(), 0);
    assert!(matches!(p.state(), PipelineState::Uninitialized));

    token.reset();
    let mut seen = Vec::new();
    {
        let stopper = token.clone();
        let mut sink = |index: usize, _: &ImageF32| -> Result<(), RegularizeError> {
            seen.push(index);
            if index == 1 {
                stopper.cancel();
            }
            Ok(())
        };
        let report = p.run(&mut source, &mut sink).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.frame_count(), 2);
    }
    assert!(p.state().prior().is_some());

    token.reset();
    let mut rest = CollectSink::default();
    let report = p.run(&mut source, &mut rest).unwrap();
    assert!(!report.cancelled);
    assert_eq!(seen, vec![0, 1]);
    assert_eq!(
        rest.frames.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
        vec![2, 3]
    );
    assert!(report.frames.iter().all(|f| f.temporal));
    assert!(matches!(p.state(), PipelineState::Done));
}

struct FailingSource {
    served: usize,
}

impl FrameSource for FailingSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, RegularizeError> {
        if self.served == 1 {
            return Err(RegularizeError::FrameRead {
                frame: 1,
                reason: "truncated file".to_string(),
            });
        }
        self.served += 1;
        Ok(Some(textured_frame(0, 12, 10)))
    }
}

#[test]
fn read_errors_abort_the_run() {
    let mut p = pipeline(SolverConfig::default());
    let err = p
        .run(&mut FailingSource { served: 0 }, &mut CollectSink::default())
        .unwrap_err();
    assert_eq!(err.frame, 1);
    assert_eq!(err.stage, Stage::Read);
    assert!(matches!(p.state(), PipelineState::Failed));

    let report = p
        .run(&mut FailingSource { served: 0 }, &mut CollectSink::default())
        .unwrap();
    assert_eq!(report.frame_count(), 0);
}

#[test]
fn mismatched_frame_fails_in_geometry() {
    let frame = Frame {
        index: 0,
        rgb: ImageRgbF32::new(8, 6),
        depth: ImageF32::new(8, 5),
    };
    let mut p = pipeline(SolverConfig::default());
    let err = p.process_frame(&frame).unwrap_err();
    assert_eq!(err.stage, Stage::Geometry);
    assert!(matches!(err.source, RegularizeError::ShapeMismatch { .. }));
}

#[test]
fn working_geometry_is_applied() {
    let geometry = GeometryOptions {
        pad: 2,
        working_size: Some([14, 10]),
        output_size: Some([40, 20]),
        ..GeometryOptions::default()
    };
    let mut p = RegularizationPipeline::new(SolverConfig::default(), geometry).unwrap();
    for i in 0..2 {
        let (out, report) = p.process_frame(&textured_frame(i, 20, 10)).unwrap();
        assert_eq!(report.working_size, [14, 10]);
        assert_eq!(report.input_size, [20, 10]);
        assert_eq!(report.temporal, i > 0);
        assert_eq!(out.dims(), (40, 20));
        assert_eq!(p.state().prior().map(|pr| pr.depth.dims()), Some((14, 10)));
        assert_eq!(p.state().prior().map(|pr| pr.rgb.dims()), Some((14, 10)));
    }
}

#[test]
fn identical_frames_move_toward_refined_prior() {
    let (w, h) = (20, 14);
    let frame = textured_frame(0, w, h);
    let mut p = pipeline(SolverConfig::default());
    let (refined, _) = p.process_frame(&frame).unwrap();
    assert_ne!(refined, frame.depth);

    let warped = warp_with_flow(&refined, &FlowField::zeros(w, h)).unwrap();
    let guess = DVector::from_iterator(w * h, frame.depth.data.iter().map(|&v| v as f64));
    let distance_to_prior = |gamma: f32| {
        let config = SolverConfig {
            gamma,
            ..SolverConfig::default()
        };
        let maps = compute_weight_maps(&frame.rgb, &frame.depth, &config.weights).unwrap();
        let system = build_system(
            &maps,
            &frame.depth,
            &config,
            TemporalTerm::Anchor {
                warped_prior: &warped,
            },
        )
        .unwrap();
        let out = solve(&system, &config, Some(&guess));
        assert!(out.converged);
        let solved = system.to_image(&out.solution).unwrap();
        solved.mean_abs_diff(&refined).unwrap()
    };
    let free = distance_to_prior(0.0);
    let anchored = distance_to_prior(0.5);
    assert!(free > 0.0);
    assert!(anchored < free, "anchored {anchored} >= free {free}");
}

#[test]
fn zero_gamma_repeats_first_frame_output() {
    let frame = textured_frame(0, 20, 14);
    let second = Frame {
        index: 1,
        ..frame.clone()
    };
    let mut p = pipeline(SolverConfig {
        gamma: 0.0,
        ..SolverConfig::default()
    });
    let mut sink = CollectSink::default();
    let report = p
        .run(&mut IterSource::new(vec![frame, second]), &mut sink)
        .unwrap();
    assert!(report.frames[1].temporal);
    assert_eq!(sink.frames[1].1, sink.frames[0].1);
}

#[test]
fn finished_pipeline_rejects_frames_until_reset() {
    let frames: Vec<Frame> = (0..2).map(|i| textured_frame(i, 12, 10)).collect();
    let mut p = pipeline(SolverConfig::default());
    p.run(&mut IterSource::new(frames), &mut CollectSink::default())
        .unwrap();
    assert!(matches!(p.state(), PipelineState::Done));

    let err = p.process_frame(&textured_frame(2, 12, 10)).unwrap_err();
    assert_eq!(err.stage, Stage::Start);
    assert!(matches!(
        err.source,
        RegularizeError::PipelineFinished { state: "done" }
    ));
    assert!(matches!(p.state(), PipelineState::Done));

    p.reset();
    let (_, report) = p.process_frame(&textured_frame(2, 12, 10)).unwrap();
    assert!(!report.temporal);
    assert!(matches!(p.state(), PipelineState::SteadyState(_)));
}

#[test]
fn invalid_config_is_rejected() {
    let config = SolverConfig {
        tolerance: 0.0,
        ..SolverConfig::default()
    };
    assert!(matches!(
        RegularizationPipeline::new(config, GeometryOptions::default()),
        Err(RegularizeError::InvalidConfig(_))
    ));
}
