mod common;

use common::init_logging;
use common::synthetic::{
    column_mean, column_variance, noisy_step_depth, ramp_depth, step_depth, textured_rgb,
};
use depth_regularizer::config::{Preconditioner, SolverConfig, SolverMethod, WeightOptions};
use depth_regularizer::image::{ImageF32, ImageRgbF32};
use depth_regularizer::stages::{
    build_system, compute_weight_maps, solve, warp_with_flow, FlowField, LinearSystem,
    TemporalTerm,
};
use nalgebra::DVector;

fn scenario_config() -> SolverConfig {
    SolverConfig {
        lambda_data: 0.04,
        smoothness: 0.01,
        tolerance: 1e-6,
        max_iterations: 30,
        ..SolverConfig::default()
    }
}

fn first_frame_system(depth: &ImageF32, config: &SolverConfig) -> LinearSystem {
    let rgb = ImageRgbF32::from_gray(depth);
    let maps = compute_weight_maps(&rgb, depth, &config.weights).unwrap();
    build_system(&maps, depth, config, TemporalTerm::None).unwrap()
}

fn as_vector(img: &ImageF32) -> DVector<f64> {
    DVector::from_iterator(img.len(), img.data.iter().map(|&v| v as f64))
}

/// Solve from the raw depth, as the pipeline does.
fn solve_first_frame(depth: &ImageF32, config: &SolverConfig) -> (ImageF32, bool) {
    let system = first_frame_system(depth, config);
    let outcome = solve(&system, config, Some(&as_vector(depth)));
    (system.to_image(&outcome.solution).unwrap(), outcome.converged)
}

#[test]
fn zero_flow_warp_is_identity() {
    let field = ramp_depth(13, 9);
    let warped = warp_with_flow(&field, &FlowField::zeros(13, 9)).unwrap();
    for (a, b) in warped.data.iter().zip(&field.data) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn zero_gamma_anchor_matches_first_frame_solve() {
    init_logging();
    let depth = ramp_depth(10, 8);
    let rgb = textured_rgb(10, 8);
    let config = SolverConfig {
        gamma: 0.0,
        ..SolverConfig::default()
    };
    let maps = compute_weight_maps(&rgb, &depth, &config.weights).unwrap();
    let prior = depth.map(|v| 1.0 - v);

    let none = build_system(&maps, &depth, &config, TemporalTerm::None).unwrap();
    let anchored = build_system(
        &maps,
        &depth,
        &config,
        TemporalTerm::Anchor {
            warped_prior: &prior,
        },
    )
    .unwrap();
    let a = solve(&none, &config, None);
    let b = solve(&anchored, &config, None);
    assert_eq!(a.iterations, b.iterations);
    assert_eq!(a.solution, b.solution);
}

#[test]
fn residual_never_grows_with_iteration_cap() {
    let depth = ramp_depth(24, 16);
    let rgb = textured_rgb(24, 16);
    for method in [SolverMethod::ConjugateGradient, SolverMethod::BiCgStab] {
        let base = SolverConfig {
            smoothness: 1.0,
            tolerance: 1e-14,
            method,
            preconditioner: Preconditioner::None,
            weights: WeightOptions {
                smoothness_gradient_scale: 1.0,
                ..WeightOptions::default()
            },
            ..SolverConfig::default()
        };
        let maps = compute_weight_maps(&rgb, &depth, &base.weights).unwrap();
        let system = build_system(&maps, &depth, &base, TemporalTerm::None).unwrap();
        let mut previous = f64::INFINITY;
        for cap in 1..=15 {
            let out = solve(&system, &base.clone().with_max_iterations(cap), None);
            assert!(
                out.relative_residual <= previous + 1e-12,
                "{method:?}: cap {cap} residual {} > {}",
                out.relative_residual,
                previous
            );
            previous = out.relative_residual;
        }
    }
}

#[test]
fn weights_stay_in_unit_interval() {
    let rgb = ImageRgbF32::from_fn(20, 14, |x, y| {
        let v = ((x * 7 + y * 3) % 10) as f32 / 9.0;
        [v, 1.0 - v, 0.5]
    });
    let depth = ImageF32::from_fn(20, 14, |x, y| ((x * x + y) % 17) as f32 / 16.0);
    for opts in [
        WeightOptions::default(),
        WeightOptions {
            edge_weight: depth_regularizer::config::EdgeWeightShape::Exponential { sigma: 0.1 },
            ..WeightOptions::default()
        },
    ] {
        let maps = compute_weight_maps(&rgb, &depth, &opts).unwrap();
        for img in [&maps.edge, &maps.data, &maps.smoothness, &maps.robust] {
            assert!(img.data.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        for (_, field) in maps.neighbors.iter() {
            assert!(field.data.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }
}

#[test]
fn flat_input_is_a_fixed_point() {
    let depth = ImageF32::filled(12, 8, 0.37);
    let config = SolverConfig::default();
    let system = first_frame_system(&depth, &config);
    let out = solve(&system, &config, Some(&as_vector(&depth)));
    assert!(out.converged);
    let solved = system.to_image(&out.solution).unwrap();
    assert!(solved.data.iter().all(|v| v.is_finite() && (v - 0.37).abs() < 1e-6));
}

#[test]
fn step_is_preserved_and_converges() {
    init_logging();
    let config = scenario_config();
    let depth = step_depth(4, 4, 0.2, 0.8);
    let (solved, converged) = solve_first_frame(&depth, &config);
    assert!(converged);
    let step = column_mean(&solved, 2, 4) - column_mean(&solved, 0, 2);
    assert!(step >= 0.8 * 0.6, "step shrank to {step}");
}

#[test]
fn noise_is_reduced_within_each_half() {
    let config = scenario_config();
    let noisy = noisy_step_depth(4, 4, 0.2, 0.8, 1e-4);
    let (solved, converged) = solve_first_frame(&noisy, &config);
    assert!(converged);
    for (x0, x1) in [(0, 2), (2, 4)] {
        let before = column_variance(&noisy, x0, x1);
        let after = column_variance(&solved, x0, x1);
        assert!(after < before, "columns {x0}..{x1}: {after} >= {before}");
    }
    let step = column_mean(&solved, 2, 4) - column_mean(&solved, 0, 2);
    assert!(step >= 0.8 * 0.6);
}

#[test]
fn temporal_term_pulls_toward_prior() {
    let depth = ramp_depth(16, 12);
    let rgb = textured_rgb(16, 12);
    let prior = depth.map(|v| v + 0.1);
    let warped = warp_with_flow(&prior, &FlowField::zeros(16, 12)).unwrap();

    let solve_with = |gamma: f32| {
        let config = SolverConfig {
            gamma,
            ..SolverConfig::default()
        };
        let maps = compute_weight_maps(&rgb, &depth, &config.weights).unwrap();
        let system = build_system(
            &maps,
            &depth,
            &config,
            TemporalTerm::Anchor {
                warped_prior: &warped,
            },
        )
        .unwrap();
        let out = solve(&system, &config, None);
        assert!(out.converged);
        system.to_image(&out.solution).unwrap()
    };

    let without = solve_with(0.0);
    let with = solve_with(0.05);
    let d_without = without.mean_abs_diff(&prior).unwrap();
    let d_with = with.mean_abs_diff(&prior).unwrap();
    assert!(d_with < d_without, "{d_with} >= {d_without}");
}
