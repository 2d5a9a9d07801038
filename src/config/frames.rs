//! Configuration of the `regularize_frames` binary.
use super::{GeometryOptions, SolverConfig};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct RegularizeFramesConfig {
    /// Directory of RGB frames, paired with depth frames by sorted file name.
    pub rgb_dir: PathBuf,
    pub depth_dir: PathBuf,
    /// Regularized depth is written here as `depth_<index>.png`.
    pub output_dir: PathBuf,
    /// Optional JSON run report.
    #[serde(default)]
    pub report_path: Option<PathBuf>,
    #[serde(default)]
    pub start_frame: usize,
    #[serde(default)]
    pub max_frames: Option<usize>,
    /// When set, edge map, data weight and flow colour PNGs are written here
    /// for every frame.
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub geometry: GeometryOptions,
}
