//! Bilinear resizing with pixel-centre alignment.
//!
//! Downscaling applies the separable Gaussian from [`crate::pyramid::filters`]
//! first to limit aliasing; upscaling samples the source directly.
use super::{sample_bilinear, ImageF32, ImageRgbF32, ImageViewMut};
use crate::error::RegularizeError;
use crate::pyramid::filters::{apply_separable, GAUSSIAN_5TAP};

/// Resize a single-channel image to `w × h`.
pub fn resize(img: &ImageF32, w: usize, h: usize) -> ImageF32 {
    if img.dims() == (w, h) {
        return img.clone();
    }
    if img.is_empty() || w == 0 || h == 0 {
        return ImageF32::new(w, h);
    }
    let blurred;
    let src = if w < img.w || h < img.h {
        blurred = apply_separable(&GAUSSIAN_5TAP, img);
        &blurred
    } else {
        img
    };
    resize_bilinear(src, w, h)
}

/// Plain bilinear resampling without any prefilter.
pub fn resize_bilinear(img: &ImageF32, w: usize, h: usize) -> ImageF32 {
    let mut out = ImageF32::new(w, h);
    if img.is_empty() {
        return out;
    }
    let sx = img.w as f32 / w as f32;
    let sy = img.h as f32 / h as f32;
    for y in 0..h {
        let src_y = (y as f32 + 0.5) * sy - 0.5;
        let row = out.row_mut(y);
        for (x, px) in row.iter_mut().enumerate() {
            let src_x = (x as f32 + 0.5) * sx - 0.5;
            *px = sample_bilinear(img, src_x, src_y);
        }
    }
    out
}

/// Resize every channel of an RGB image to `w × h`.
pub fn resize_rgb(img: &ImageRgbF32, w: usize, h: usize) -> Result<ImageRgbF32, RegularizeError> {
    if img.dims() == (w, h) {
        return Ok(img.clone());
    }
    let [r, g, b] = img.channels();
    ImageRgbF32::from_channels(&[resize(&r, w, h), resize(&g, w, h), resize(&b, w, h)])
}
