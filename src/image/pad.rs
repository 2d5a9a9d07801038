//! Border padding for equirectangular frames.
//!
//! A 360° panorama is periodic horizontally, so columns wrap around; rows are
//! mirrored symmetrically at the poles (edge sample repeated, as in
//! `[.., b, a | a, b, ..]`). Padding is applied before the solve so that the
//! seam and pole rows get a full neighbourhood, and removed afterwards.
use super::{ImageF32, ImageRgbF32};

#[inline]
fn wrap_index(i: isize, n: usize) -> usize {
    i.rem_euclid(n as isize) as usize
}

/// Symmetric reflection including the edge sample, valid for any offset.
#[inline]
fn symmetric_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

fn source_index(x: usize, y: usize, pad: usize, w: usize, h: usize) -> (usize, usize) {
    let sx = wrap_index(x as isize - pad as isize, w);
    let sy = symmetric_index(y as isize - pad as isize, h);
    (sx, sy)
}

/// Pad by `pad` pixels on every side: wrap horizontally, mirror vertically.
pub fn pad_equirect(img: &ImageF32, pad: usize) -> ImageF32 {
    if pad == 0 || img.is_empty() {
        return img.clone();
    }
    let (w, h) = img.dims();
    ImageF32::from_fn(w + 2 * pad, h + 2 * pad, |x, y| {
        let (sx, sy) = source_index(x, y, pad, w, h);
        img.get(sx, sy)
    })
}

/// RGB variant of [`pad_equirect`].
pub fn pad_equirect_rgb(img: &ImageRgbF32, pad: usize) -> ImageRgbF32 {
    if pad == 0 || img.w == 0 || img.h == 0 {
        return img.clone();
    }
    let (w, h) = img.dims();
    ImageRgbF32::from_fn(w + 2 * pad, h + 2 * pad, |x, y| {
        let (sx, sy) = source_index(x, y, pad, w, h);
        img.get(sx, sy)
    })
}

/// Remove `pad` pixels from every side. Returns an empty image when the pad
/// exceeds the image.
pub fn crop_padding(img: &ImageF32, pad: usize) -> ImageF32 {
    if pad == 0 {
        return img.clone();
    }
    let w = img.w.saturating_sub(2 * pad);
    let h = img.h.saturating_sub(2 * pad);
    ImageF32::from_fn(w, h, |x, y| img.get(x + pad, y + pad))
}
