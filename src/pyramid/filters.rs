//! Separable 1D filters applied along rows then columns with clamped borders.
use crate::image::{ImageF32, ImageView, ImageViewMut};

/// Trait implemented by separable 1D filters used for blurring before
/// decimation and for the edge-map smoothing.
pub trait SeparableFilter {
    /// Return the 1D taps (in left-to-right order). The kernel is assumed to be
    /// symmetric around its centre, but the implementation does not rely on it.
    fn taps(&self) -> &[f32];
}

/// Simple wrapper around a static filter kernel.
#[derive(Clone, Copy, Debug)]
pub struct StaticSeparableFilter {
    taps: &'static [f32],
}

impl Default for StaticSeparableFilter {
    fn default() -> Self {
        GAUSSIAN_5TAP
    }
}

impl StaticSeparableFilter {
    pub const fn new(taps: &'static [f32]) -> Self {
        Self { taps }
    }
}

impl SeparableFilter for StaticSeparableFilter {
    #[inline]
    fn taps(&self) -> &[f32] {
        self.taps
    }
}

/// Normalised 5-tap Gaussian filter `[1, 4, 6, 4, 1] / 16`.
pub const GAUSSIAN_5TAP: StaticSeparableFilter =
    StaticSeparableFilter::new(&[0.0625, 0.25, 0.375, 0.25, 0.0625]);

/// Normalised 3-tap Gaussian filter `[1, 2, 1] / 4` (3×3 Gaussian, σ≈0.85).
pub const GAUSSIAN_3TAP: StaticSeparableFilter = StaticSeparableFilter::new(&[0.25, 0.5, 0.25]);

/// Normalised 3-tap box filter.
pub const BOX_3TAP: StaticSeparableFilter =
    StaticSeparableFilter::new(&[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]);

#[inline]
fn clamp_index(idx: isize, upper: usize) -> usize {
    idx.clamp(0, upper as isize - 1) as usize
}

/// Convolve `src` with the filter horizontally and vertically.
pub fn apply_separable<F: SeparableFilter + ?Sized>(filter: &F, src: &ImageF32) -> ImageF32 {
    let taps = filter.taps();
    if src.is_empty() || taps.is_empty() {
        return src.clone();
    }
    let radius = (taps.len() / 2) as isize;
    let (w, h) = src.dims();

    let mut tmp = ImageF32::new(w, h);
    for y in 0..h {
        let src_row = src.row(y);
        let dst_row = tmp.row_mut(y);
        for (x, dst) in dst_row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &tap) in taps.iter().enumerate() {
                let sx = clamp_index(x as isize + k as isize - radius, w);
                acc += tap * src_row[sx];
            }
            *dst = acc;
        }
    }

    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        let dst_row = out.row_mut(y);
        for (k, &tap) in taps.iter().enumerate() {
            let sy = clamp_index(y as isize + k as isize - radius, h);
            let src_row = tmp.row(sy);
            for (dst, &v) in dst_row.iter_mut().zip(src_row) {
                *dst += tap * v;
            }
        }
    }
    out
}

/// Box filter with an odd window `size` (values `<= 1` return a copy).
pub fn box_filter(src: &ImageF32, size: usize) -> ImageF32 {
    if size <= 1 || src.is_empty() {
        return src.clone();
    }
    let size = size | 1;
    let taps = vec![1.0 / size as f32; size];
    apply_separable(&DynamicFilter { taps }, src)
}

struct DynamicFilter {
    taps: Vec<f32>,
}

impl SeparableFilter for DynamicFilter {
    fn taps(&self) -> &[f32] {
        &self.taps
    }
}
