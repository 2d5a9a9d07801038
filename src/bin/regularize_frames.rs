use depth_regularizer::config::{load_config, RegularizeFramesConfig};
use depth_regularizer::flow::flow_to_rgb;
use depth_regularizer::image::io::{save_gray_f32, save_rgb_f32, write_json_file};
use depth_regularizer::image::ImageF32;
use depth_regularizer::pipeline::{
    DebugArtifacts, DebugHook, DirectoryFrameSource, FrameSink, RegularizationPipeline,
};
use depth_regularizer::RegularizeError;
use log::info;
use std::env;
use std::path::{Path, PathBuf};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn usage() -> String {
    "Usage: regularize_frames <config.json>".to_string()
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config: RegularizeFramesConfig =
        load_config(Path::new(&config_path)).map_err(|e| e.to_string())?;

    let mut source = DirectoryFrameSource::new(&config.rgb_dir, &config.depth_dir)
        .map_err(|e| e.to_string())?
        .with_window(config.start_frame, config.max_frames);
    info!(
        "regularizing {} frames from {}",
        source.remaining(),
        config.rgb_dir.display()
    );

    let mut pipeline = RegularizationPipeline::new(config.solver.clone(), config.geometry.clone())
        .map_err(|e| e.to_string())?;
    if let Some(dir) = &config.debug_dir {
        pipeline = pipeline.with_debug_hook(debug_dump(dir.clone()));
    }

    let mut sink = PngSink {
        dir: config.output_dir.clone(),
    };
    let report = pipeline
        .run(&mut source, &mut sink)
        .map_err(|e| e.to_string())?;

    let non_converged = report.non_converged().count();
    println!(
        "Regularized {} frames in {:.1} ms ({} warnings, {} frames hit the iteration cap)",
        report.frame_count(),
        report.total_ms,
        report.warning_count(),
        non_converged
    );
    if let Some(path) = &config.report_path {
        write_json_file(path, &report).map_err(|e| e.to_string())?;
        println!("Saved run report to {}", path.display());
    }
    Ok(())
}

struct PngSink {
    dir: PathBuf,
}

impl FrameSink for PngSink {
    fn consume(&mut self, index: usize, depth: &ImageF32) -> Result<(), RegularizeError> {
        let path = self.dir.join(format!("depth_{index:05}.png"));
        save_gray_f32(depth, &path).map_err(|e| RegularizeError::FrameWrite {
            frame: index,
            reason: e.to_string(),
        })
    }
}

fn debug_dump(dir: PathBuf) -> DebugHook {
    Box::new(move |index: usize, artifacts: &DebugArtifacts<'_>| {
        save_gray_f32(
            &artifacts.weights.edge,
            &dir.join(format!("edges_{index:05}.png")),
        )?;
        save_gray_f32(
            &artifacts.weights.data,
            &dir.join(format!("data_weight_{index:05}.png")),
        )?;
        if let Some(flow) = artifacts.flow {
            save_rgb_f32(&flow_to_rgb(flow), &dir.join(format!("flow_{index:05}.png")))?;
        }
        Ok(())
    })
}
