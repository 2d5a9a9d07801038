//! Bilinear sampling with coordinates clamped to the image extents.
use super::ImageF32;

/// Sample `img` at the continuous position `(x, y)` (pixel centres at integer
/// coordinates). Coordinates outside the image are clamped to the border, so
/// no value is ever extrapolated.
#[inline]
pub fn sample_bilinear(img: &ImageF32, x: f32, y: f32) -> f32 {
    if img.is_empty() {
        return 0.0;
    }
    let max_x = (img.w - 1) as f32;
    let max_y = (img.h - 1) as f32;
    let x = if x.is_finite() { x.clamp(0.0, max_x) } else { 0.0 };
    let y = if y.is_finite() { y.clamp(0.0, max_y) } else { 0.0 };

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(img.w - 1);
    let y1 = (y0 + 1).min(img.h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let v00 = img.get(x0, y0);
    let v10 = img.get(x1, y0);
    let v01 = img.get(x0, y1);
    let v11 = img.get(x1, y1);
    // Integer positions return the stored value exactly.
    if fx == 0.0 && fy == 0.0 {
        return v00;
    }
    let top = v00 + (v10 - v00) * fx;
    let bottom = v01 + (v11 - v01) * fx;
    top + (bottom - top) * fy
}
