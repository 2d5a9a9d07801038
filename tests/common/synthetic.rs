use depth_regularizer::image::{ImageF32, ImageRgbF32};
use depth_regularizer::pipeline::Frame;

/// Smooth, well-textured intensity pattern in `[0.2, 0.8]`.
pub fn pattern(x: f32, y: f32) -> f32 {
    0.5 + 0.2 * (0.3 * x).sin() * (0.25 * y).cos() + 0.1 * (0.17 * (x + y)).sin()
}

pub fn textured_rgb(w: usize, h: usize) -> ImageRgbF32 {
    ImageRgbF32::from_fn(w, h, |x, y| {
        let v = pattern(x as f32, y as f32);
        [v, 0.9 * v, 0.8 * v + 0.1]
    })
}

/// Depth with two flat halves: `left` for `x < w / 2`, `right` otherwise.
pub fn step_depth(w: usize, h: usize, left: f32, right: f32) -> ImageF32 {
    ImageF32::from_fn(w, h, |x, _| if x < w / 2 { left } else { right })
}

/// Step depth with zero-mean noise `±amplitude` alternating down the two
/// outermost columns.
pub fn noisy_step_depth(w: usize, h: usize, left: f32, right: f32, amplitude: f32) -> ImageF32 {
    let mut depth = step_depth(w, h, left, right);
    for y in 0..h {
        let e = if y % 2 == 0 { amplitude } else { -amplitude };
        depth.set(0, y, depth.get(0, y) + e);
        depth.set(w - 1, y, depth.get(w - 1, y) + e);
    }
    depth
}

/// Gentle depth ramp with a ripple, strictly inside `(0, 1)`.
pub fn ramp_depth(w: usize, h: usize) -> ImageF32 {
    ImageF32::from_fn(w, h, |x, y| {
        0.3 + 0.3 * x as f32 / w as f32 + 0.05 * (0.7 * y as f32).sin()
    })
}

pub fn gray_frame(index: usize, depth: ImageF32) -> Frame {
    Frame {
        index,
        rgb: ImageRgbF32::from_gray(&depth),
        depth,
    }
}

pub fn textured_frame(index: usize, w: usize, h: usize) -> Frame {
    Frame {
        index,
        rgb: textured_rgb(w, h),
        depth: ramp_depth(w, h),
    }
}

/// Population variance of the pixels in columns `x0..x1`.
pub fn column_variance(img: &ImageF32, x0: usize, x1: usize) -> f64 {
    let vals: Vec<f64> = (0..img.h)
        .flat_map(|y| (x0..x1).map(move |x| (x, y)))
        .map(|(x, y)| img.get(x, y) as f64)
        .collect();
    let mean = vals.iter().sum::<f64>() / vals.len() as f64;
    vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / vals.len() as f64
}

pub fn column_mean(img: &ImageF32, x0: usize, x1: usize) -> f64 {
    let mut sum = 0.0;
    for y in 0..img.h {
        for x in x0..x1 {
            sum += img.get(x, y) as f64;
        }
    }
    sum / ((x1 - x0) * img.h) as f64
}
