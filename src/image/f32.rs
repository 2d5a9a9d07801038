//! Owned single-channel f32 image in row-major layout (stride == width).
//!
//! Used for depth fields, weight maps and flow components. Provides row access
//! and a contiguous slice for whole-image passes.
use crate::error::RegularizeError;

#[derive(Clone, Debug, PartialEq)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of f32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self::filled(w, h, 0.0)
    }

    /// Construct a buffer of size `w × h` with every pixel set to `value`.
    pub fn filled(w: usize, h: usize, value: f32) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![value; w * h],
        }
    }

    /// Wrap an existing row-major buffer.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Result<Self, RegularizeError> {
        if data.len() != w * h {
            return Err(RegularizeError::BufferLength {
                expected: w * h,
                actual: data.len(),
            });
        }
        Ok(Self {
            w,
            h,
            stride: w,
            data,
        })
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(w: usize, h: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                data.push(f(x, y));
            }
        }
        Self {
            w,
            h,
            stride: w,
            data,
        }
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.w * self.h
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }
    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Pixel lookup with replicated borders for signed coordinates.
    #[inline]
    pub fn get_clamped(&self, x: isize, y: isize) -> f32 {
        let xc = x.clamp(0, self.w as isize - 1) as usize;
        let yc = y.clamp(0, self.h as isize - 1) as usize;
        self.get(xc, yc)
    }

    /// Apply `f` to every pixel, producing a new image.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            w: self.w,
            h: self.h,
            stride: self.stride,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Clamp every pixel to `[0, 1]` in place.
    pub fn clip01(&mut self) {
        for v in &mut self.data {
            *v = v.clamp(0.0, 1.0);
        }
    }

    /// Largest pixel value, or `0.0` for an empty image.
    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(0.0f32, f32::max)
    }

    /// Minimum and maximum pixel values, `None` for an empty image.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut iter = self.data.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Mean absolute difference against another image of equal size.
    pub fn mean_abs_diff(&self, other: &ImageF32) -> Option<f32> {
        if self.dims() != other.dims() || self.is_empty() {
            return None;
        }
        let sum: f64 = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs() as f64)
            .sum();
        Some((sum / self.len() as f64) as f32)
    }
}

impl crate::image::traits::ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

impl crate::image::traits::ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        let end = start + self.w;
        &mut self.data[start..end]
    }
}
