//! Working geometry around the solve.
//!
//! Before the solve the raw depth is optionally stretched to `[0, 1]` and
//! one half of a side-by-side stereo frame is optionally selected. The frame
//! is then padded (columns wrap across the 360° seam,
//! rows mirror at the poles) and resized to the working resolution. After
//! the solve the depth goes back to the padded input size, is refined with
//! the padded RGB as guide, cropped, and optionally resized to the output
//! resolution. With default options every step is the identity.
use super::Frame;
use crate::bilateral::joint_bilateral_filter;
use crate::config::{BilateralOptions, GeometryOptions, HalfFrame};
use crate::error::RegularizeError;
use crate::image::pad::{crop_padding, pad_equirect, pad_equirect_rgb};
use crate::image::resize::{resize, resize_rgb};
use crate::image::{ImageF32, ImageRgbF32};

/// A frame brought to working resolution.
#[derive(Clone, Debug)]
pub struct WorkingFrame {
    pub rgb: ImageRgbF32,
    pub depth: ImageF32,
    /// Padded RGB at input resolution, the guide for the bilateral pass.
    pub guide: ImageRgbF32,
    /// Frame size after the half-frame cut, before padding.
    pub input_size: (usize, usize),
}

impl WorkingFrame {
    pub fn working_size(&self) -> (usize, usize) {
        self.depth.dims()
    }
}

/// Refined depth of one frame.
#[derive(Clone, Debug)]
pub struct FinishedDepth {
    /// Depth at the output resolution.
    pub output: ImageF32,
    /// Refined depth at working resolution, carried to the next frame.
    pub prior: ImageF32,
}

/// Stretch `depth` linearly so its extremes become 0 and 1.
fn stretch_to_unit(depth: &ImageF32) -> ImageF32 {
    match depth.min_max() {
        Some((lo, hi)) if hi > lo => depth.map(|v| ((v - lo) / (hi - lo)).clamp(0.0, 1.0)),
        _ => depth.clone(),
    }
}

fn column_range(half: HalfFrame, w: usize) -> (usize, usize) {
    match half {
        HalfFrame::Full => (0, w),
        HalfFrame::Left => (0, w / 2),
        HalfFrame::Right => (w / 2, w),
    }
}

fn check_size(what: &str, size: Option<[usize; 2]>) -> Result<(), RegularizeError> {
    match size {
        Some([w, h]) if w == 0 || h == 0 => Err(RegularizeError::InvalidConfig(format!(
            "{what} {w}x{h} is empty"
        ))),
        _ => Ok(()),
    }
}

pub fn prepare(frame: &Frame, options: &GeometryOptions) -> Result<WorkingFrame, RegularizeError> {
    let (fw, fh) = frame.depth.dims();
    if frame.rgb.dims() != (fw, fh) {
        return Err(RegularizeError::ShapeMismatch {
            context: "frame (rgb vs depth)",
            expected: (fw, fh),
            actual: frame.rgb.dims(),
        });
    }
    check_size("working size", options.working_size)?;
    check_size("output size", options.output_size)?;

    let (x0, x1) = column_range(options.half_frame, fw);
    let (w, h) = (x1 - x0, fh);
    if w == 0 || h == 0 {
        return Err(RegularizeError::InvalidConfig(format!(
            "frame {} is empty ({w}x{h} after the half-frame cut)",
            frame.index
        )));
    }
    let pad = options.pad;
    if pad >= w || pad >= h {
        return Err(RegularizeError::InvalidConfig(format!(
            "padding {pad} does not fit a {w}x{h} frame"
        )));
    }

    let depth = if options.normalize_depth {
        stretch_to_unit(&frame.depth)
    } else {
        frame.depth.clone()
    };
    let (depth, rgb) = if (x0, x1) == (0, fw) {
        (depth, frame.rgb.clone())
    } else {
        (
            ImageF32::from_fn(w, h, |x, y| depth.get(x0 + x, y)),
            ImageRgbF32::from_fn(w, h, |x, y| frame.rgb.get(x0 + x, y)),
        )
    };

    let guide = pad_equirect_rgb(&rgb, pad);
    let padded_depth = pad_equirect(&depth, pad);
    let (ww, wh) = match options.working_size {
        Some([ww, wh]) => (ww, wh),
        None => padded_depth.dims(),
    };
    Ok(WorkingFrame {
        rgb: resize_rgb(&guide, ww, wh)?,
        depth: resize(&padded_depth, ww, wh),
        guide,
        input_size: (w, h),
    })
}

pub fn finish(
    solved: &ImageF32,
    working: &WorkingFrame,
    options: &GeometryOptions,
    bilateral: &BilateralOptions,
) -> Result<FinishedDepth, RegularizeError> {
    let (pw, ph) = working.guide.dims();
    let mut padded = resize(solved, pw, ph);
    padded.clip01();
    let refined = joint_bilateral_filter(&padded, &working.guide, bilateral)?;

    let (ww, wh) = working.working_size();
    let prior = resize(&refined, ww, wh);

    let cropped = crop_padding(&refined, options.pad);
    let mut output = match options.output_size {
        Some([ow, oh]) => resize(&cropped, ow, oh),
        None => cropped,
    };
    output.clip01();
    Ok(FinishedDepth { output, prior })
}
