use serde::{Deserialize, Serialize};

/// Half of a side-by-side stereo panorama to keep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfFrame {
    /// Keep the whole frame.
    #[default]
    Full,
    /// Columns `0..w / 2`.
    Left,
    /// Columns `w / 2..w`.
    Right,
}

/// Working geometry for equirectangular input.
///
/// With the defaults the solve runs on the frames exactly as delivered.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryOptions {
    /// Stretch each raw depth frame to span `[0, 1]` before anything else.
    /// A constant frame is left unchanged.
    pub normalize_depth: bool,
    /// Half of a side-by-side stereo frame to process. Applied after the
    /// depth stretch; everything downstream, output included, sees only
    /// this half.
    pub half_frame: HalfFrame,
    /// Border added on every side before processing: columns wrap around the
    /// 360° seam, rows mirror at the poles.
    pub pad: usize,
    /// Resolution `[w, h]` of the padded frame used for weights, flow and the
    /// solve. `None` keeps the padded input resolution.
    pub working_size: Option<[usize; 2]>,
    /// Resolution `[w, h]` of the emitted depth. `None` keeps the input
    /// resolution (after the half-frame cut).
    pub output_size: Option<[usize; 2]>,
}
