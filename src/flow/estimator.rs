//! Coarse-to-fine dense Lucas–Kanade.
//!
//! Both frames are decomposed into pyramids. Starting at the coarsest level
//! with zero flow, each level
//! 1. forms the windowed structure tensor of the previous frame once,
//! 2. warps the current frame toward the previous one with the running flow,
//! 3. solves the 2×2 normal equations per pixel for an update, refreshing the
//!    temporal residual `inner_iterations` times,
//! 4. median-filters the flow,
//!
//! and repeats steps 2 to 4 `outer_iterations` times before the flow is
//! upsampled (and median-filtered again) for the next finer level.
//!
//! Pixels whose tensor has a small eigenvalue are not updated and take their
//! flow from the median pass. All per-pixel work is row-parallel and order
//! independent, so the result is deterministic.
use super::{FlowEstimate, FlowField};
use crate::config::FlowOptions;
use crate::edges::{central_differences, median_filter};
use crate::error::RegularizeError;
use crate::image::resize::resize_bilinear;
use crate::image::{sample_bilinear, ImageF32};
use crate::parallel::for_each_row_mut;
use crate::pyramid::filters::box_filter;
use crate::pyramid::{Pyramid, PyramidOptions};
use log::debug;
use nalgebra::{Matrix2, Vector2};

/// Windowed means of the gradient products `Ix²`, `IxIy`, `Iy²`.
struct StructureTensor {
    xx: ImageF32,
    xy: ImageF32,
    yy: ImageF32,
}

impl StructureTensor {
    fn from_gradients(ix: &ImageF32, iy: &ImageF32, window: usize) -> Self {
        let prod = |a: &ImageF32, b: &ImageF32| {
            let mut out = a.clone();
            for (o, v) in out.data.iter_mut().zip(&b.data) {
                *o *= v;
            }
            box_filter(&out, window)
        };
        Self {
            xx: prod(ix, ix),
            xy: prod(ix, iy),
            yy: prod(iy, iy),
        }
    }

    #[inline]
    fn at(&self, i: usize) -> Matrix2<f32> {
        let xy = self.xy.data[i];
        Matrix2::new(self.xx.data[i], xy, xy, self.yy.data[i])
    }

    fn textured_fraction(&self, min_eigenvalue: f32) -> f32 {
        let n = self.xx.data.len();
        if n == 0 {
            return 0.0;
        }
        let textured = (0..n)
            .filter(|&i| min_eigenvalue_of(&self.at(i)) >= min_eigenvalue)
            .count();
        textured as f32 / n as f32
    }
}

/// Smaller eigenvalue of a symmetric 2×2 matrix.
#[inline]
fn min_eigenvalue_of(m: &Matrix2<f32>) -> f32 {
    let half_trace = 0.5 * m.trace();
    let disc = (half_trace * half_trace - m.determinant()).max(0.0);
    half_trace - disc.sqrt()
}

/// Temporal residual `curr(x + d) - prev(x)`, zero where `x + d` leaves the
/// image.
fn warped_residual(prev: &ImageF32, curr: &ImageF32, field: &FlowField) -> ImageF32 {
    let (w, h) = prev.dims();
    let (max_x, max_y) = (w as f32 - 1.0, h as f32 - 1.0);
    let mut out = ImageF32::new(w, h);
    for_each_row_mut(&mut out.data, w, |y, row| {
        for (x, r) in row.iter_mut().enumerate() {
            let (dx, dy) = field.get(x, y);
            let (sx, sy) = (x as f32 + dx, y as f32 + dy);
            if (0.0..=max_x).contains(&sx) && (0.0..=max_y).contains(&sy) {
                *r = sample_bilinear(curr, sx, sy) - prev.get(x, y);
            }
        }
    });
    out
}

fn median_flow(field: &FlowField, window: usize) -> FlowField {
    FlowField {
        dx: median_filter(&field.dx, window),
        dy: median_filter(&field.dy, window),
    }
}

fn upsample_flow(coarse: &FlowField, w: usize, h: usize) -> FlowField {
    let (cw, ch) = coarse.dims();
    let sx = w as f32 / cw.max(1) as f32;
    let sy = h as f32 / ch.max(1) as f32;
    FlowField {
        dx: resize_bilinear(&coarse.dx, w, h).map(|v| v * sx),
        dy: resize_bilinear(&coarse.dy, w, h).map(|v| v * sy),
    }
}

#[derive(Clone, Debug)]
pub struct FlowEstimator {
    options: FlowOptions,
}

impl FlowEstimator {
    pub fn new(options: FlowOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FlowOptions {
        &self.options
    }

    fn window(&self) -> usize {
        2 * self.options.window_radius + 1
    }

    /// Estimate the displacement of every pixel of `prev` into `curr`, so that
    /// `prev(x) ≈ curr(x + d(x))`.
    pub fn estimate(&self, prev: &ImageF32, curr: &ImageF32) -> Result<FlowEstimate, RegularizeError> {
        if prev.dims() != curr.dims() {
            return Err(RegularizeError::ShapeMismatch {
                context: "flow estimation",
                expected: prev.dims(),
                actual: curr.dims(),
            });
        }
        let (w, h) = prev.dims();
        let prev = prev.map(|v| v.clamp(0.0, 1.0));
        let curr = curr.map(|v| v.clamp(0.0, 1.0));

        let (ix, iy) = central_differences(&prev);
        let textured_fraction = StructureTensor::from_gradients(&ix, &iy, self.window())
            .textured_fraction(self.options.min_eigenvalue);
        if textured_fraction < self.options.min_textured_fraction {
            debug!(
                "flow: textured fraction {:.4} below {:.4}, returning zero flow",
                textured_fraction, self.options.min_textured_fraction
            );
            return Ok(FlowEstimate {
                field: FlowField::zeros(w, h),
                textured_fraction,
                insufficient_texture: true,
                levels: 0,
            });
        }

        let pyramid_options = PyramidOptions::new(self.options.ratio, self.options.min_width)
            .with_max_levels(self.options.max_levels);
        let prev_pyr = Pyramid::build(&prev, pyramid_options);
        let curr_pyr = Pyramid::build(&curr, pyramid_options);

        let mut flow: Option<FlowField> = None;
        for (level, (p, c)) in prev_pyr
            .levels
            .iter()
            .zip(&curr_pyr.levels)
            .enumerate()
            .rev()
        {
            let mut field = match flow.take() {
                Some(coarse) => median_flow(
                    &upsample_flow(&coarse, p.w, p.h),
                    self.options.median_window,
                ),
                None => FlowField::zeros(p.w, p.h),
            };
            self.refine_level(p, c, &mut field);
            debug!(
                "flow: level {level} ({}x{}) mean |d| {:.3}",
                p.w,
                p.h,
                field.stats().mean_magnitude
            );
            flow = Some(field);
        }

        Ok(FlowEstimate {
            field: flow.unwrap_or_else(|| FlowField::zeros(w, h)),
            textured_fraction,
            insufficient_texture: false,
            levels: prev_pyr.len(),
        })
    }

    fn refine_level(&self, prev: &ImageF32, curr: &ImageF32, field: &mut FlowField) {
        let (w, h) = prev.dims();
        if w == 0 || h == 0 {
            return;
        }
        let window = self.window();
        let min_eig = self.options.min_eigenvalue;
        let max_step = self.options.max_step;

        let (ix, iy) = central_differences(prev);
        let tensor = StructureTensor::from_gradients(&ix, &iy, window);

        for _ in 0..self.options.outer_iterations {
            for _ in 0..self.options.inner_iterations.max(1) {
                let it = warped_residual(prev, curr, field);
                let mut bx = ix.clone();
                let mut by = iy.clone();
                for ((gx, gy), t) in bx.data.iter_mut().zip(by.data.iter_mut()).zip(&it.data) {
                    *gx *= t;
                    *gy *= t;
                }
                let bx = box_filter(&bx, window);
                let by = box_filter(&by, window);

                let mut steps = vec![[0.0f32; 2]; w * h];
                for_each_row_mut(&mut steps, w, |y, row| {
                    for (x, step) in row.iter_mut().enumerate() {
                        let i = y * w + x;
                        let m = tensor.at(i);
                        if min_eigenvalue_of(&m) < min_eig {
                            continue;
                        }
                        let Some(inv) = m.try_inverse() else {
                            continue;
                        };
                        let mut d = -(inv * Vector2::new(bx.data[i], by.data[i]));
                        let norm = d.norm();
                        if !norm.is_finite() {
                            continue;
                        }
                        if norm > max_step {
                            d *= max_step / norm;
                        }
                        *step = [d.x, d.y];
                    }
                });
                for ((u, v), [su, sv]) in field
                    .dx
                    .data
                    .iter_mut()
                    .zip(field.dy.data.iter_mut())
                    .zip(steps)
                {
                    *u += su;
                    *v += sv;
                }
            }
            *field = median_flow(field, self.options.median_window);
        }
    }
}
