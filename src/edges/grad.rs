//! Image gradients (Sobel and central differences).
//!
//! - Convolves a 3×3 kernel pair (`X` and `Y`) with border clamping.
//! - Outputs per-pixel `gx`, `gy`, `mag = sqrt(gx^2+gy^2)`.
//! - Rows are processed independently (in parallel with the `parallel`
//!   feature).
//!
//! Complexity: O(W·H) per pass; memory: three float buffers.
use crate::image::{ImageF32, ImageView};
use crate::parallel::for_each_row_mut;

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Per-pixel gradient buffers.
#[derive(Clone, Debug)]
pub struct Grad {
    /// Horizontal derivative (convolution with kernel X)
    pub gx: ImageF32,
    /// Vertical derivative (convolution with kernel Y)
    pub gy: ImageF32,
    /// Euclidean magnitude per pixel: `sqrt(gx^2 + gy^2)`
    pub mag: ImageF32,
}

#[inline]
fn convolve_at(rows: &[&[f32]; 3], x_idx: &[usize; 3], kernel: &Kernel3) -> f32 {
    let mut sum = 0.0;
    for (row, k) in rows.iter().zip(kernel) {
        sum += row[x_idx[0]] * k[0] + row[x_idx[1]] * k[1] + row[x_idx[2]] * k[2];
    }
    sum
}

fn kernel_response(l: &ImageF32, kernel: &Kernel3) -> ImageF32 {
    let (w, h) = l.dims();
    let mut out = ImageF32::new(w, h);
    if l.is_empty() {
        return out;
    }
    for_each_row_mut(&mut out.data, w, |y, dst| {
        let rows = [
            l.row(y.saturating_sub(1)),
            l.row(y),
            l.row((y + 1).min(h - 1)),
        ];
        for (x, px) in dst.iter_mut().enumerate() {
            let x_idx = [x.saturating_sub(1), x, (x + 1).min(w - 1)];
            *px = convolve_at(&rows, &x_idx, kernel);
        }
    });
    out
}

fn gradients_with_kernels(l: &ImageF32, kernel_x: &Kernel3, kernel_y: &Kernel3) -> Grad {
    let gx = kernel_response(l, kernel_x);
    let gy = kernel_response(l, kernel_y);
    let mag = ImageF32 {
        w: l.w,
        h: l.h,
        stride: l.w,
        data: gx
            .data
            .iter()
            .zip(&gy.data)
            .map(|(a, b)| (a * a + b * b).sqrt())
            .collect(),
    };
    Grad { gx, gy, mag }
}

/// Compute Sobel gradients on a single-channel float image.
pub fn sobel_gradients(l: &ImageF32) -> Grad {
    gradients_with_kernels(l, &SOBEL_KERNEL_X, &SOBEL_KERNEL_Y)
}

/// Sobel gradient magnitude only.
pub fn sobel_magnitude(l: &ImageF32) -> ImageF32 {
    sobel_gradients(l).mag
}

/// Central differences `((I(x+1) - I(x-1)) / 2, (I(y+1) - I(y-1)) / 2)` with
/// clamped borders. Cheaper than Sobel and unit-scaled, which is what the
/// flow linearisation expects.
pub fn central_differences(l: &ImageF32) -> (ImageF32, ImageF32) {
    let (w, h) = l.dims();
    let mut ix = ImageF32::new(w, h);
    let mut iy = ImageF32::new(w, h);
    if l.is_empty() {
        return (ix, iy);
    }
    for_each_row_mut(&mut ix.data, w, |y, dst| {
        let row = l.row(y);
        for (x, px) in dst.iter_mut().enumerate() {
            *px = 0.5 * (row[(x + 1).min(w - 1)] - row[x.saturating_sub(1)]);
        }
    });
    for_each_row_mut(&mut iy.data, w, |y, dst| {
        let above = l.row(y.saturating_sub(1));
        let below = l.row((y + 1).min(h - 1));
        for (x, px) in dst.iter_mut().enumerate() {
            *px = 0.5 * (below[x] - above[x]);
        }
    });
    (ix, iy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_image_has_zero_gradient() {
        let img = ImageF32::filled(6, 6, 0.7);
        let g = sobel_gradients(&img);
        assert!(g.mag.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn vertical_step_responds_in_x() {
        let img = ImageF32::from_fn(8, 4, |x, _| if x < 4 { 0.0 } else { 1.0 });
        let g = sobel_gradients(&img);
        assert!((g.gx.get(3, 2) - 4.0).abs() < 1e-6);
        assert!((g.gx.get(4, 2) - 4.0).abs() < 1e-6);
        assert_eq!(g.gy.get(3, 2), 0.0);
        assert_eq!(g.mag.get(0, 2), 0.0);
    }

    #[test]
    fn central_differences_of_ramp() {
        let img = ImageF32::from_fn(5, 5, |x, y| 0.1 * x as f32 + 0.2 * y as f32);
        let (ix, iy) = central_differences(&img);
        assert!((ix.get(2, 2) - 0.1).abs() < 1e-6);
        assert!((iy.get(2, 2) - 0.2).abs() < 1e-6);
    }
}
