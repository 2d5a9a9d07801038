//! Owned interleaved RGB f32 image (H×W×3, values in `[0, 1]`).
use super::ImageF32;
use crate::error::RegularizeError;

/// ITU-R BT.601 luma weights, matching the usual RGB→gray conversion.
const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

#[derive(Clone, Debug, PartialEq)]
pub struct ImageRgbF32 {
    pub w: usize,
    pub h: usize,
    /// Interleaved `[r, g, b]` triples in row-major order.
    pub data: Vec<[f32; 3]>,
}

impl ImageRgbF32 {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![[0.0; 3]; w * h],
        }
    }

    pub fn from_vec(w: usize, h: usize, data: Vec<[f32; 3]>) -> Result<Self, RegularizeError> {
        if data.len() != w * h {
            return Err(RegularizeError::BufferLength {
                expected: w * h,
                actual: data.len(),
            });
        }
        Ok(Self { w, h, data })
    }

    pub fn from_fn(w: usize, h: usize, mut f: impl FnMut(usize, usize) -> [f32; 3]) -> Self {
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                data.push(f(x, y));
            }
        }
        Self { w, h, data }
    }

    /// Replicate a gray image into all three channels.
    pub fn from_gray(gray: &ImageF32) -> Self {
        Self {
            w: gray.w,
            h: gray.h,
            data: gray.data.iter().map(|&v| [v, v, v]).collect(),
        }
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [f32; 3] {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: [f32; 3]) {
        self.data[y * self.w + x] = v;
    }

    /// Split into three single-channel planes.
    pub fn channels(&self) -> [ImageF32; 3] {
        let mut planes = [
            ImageF32::new(self.w, self.h),
            ImageF32::new(self.w, self.h),
            ImageF32::new(self.w, self.h),
        ];
        for (i, px) in self.data.iter().enumerate() {
            for (c, plane) in planes.iter_mut().enumerate() {
                plane.data[i] = px[c];
            }
        }
        planes
    }

    /// Interleave three equally sized planes.
    pub fn from_channels(planes: &[ImageF32; 3]) -> Result<Self, RegularizeError> {
        let (w, h) = planes[0].dims();
        for plane in &planes[1..] {
            if plane.dims() != (w, h) {
                return Err(RegularizeError::ShapeMismatch {
                    context: "rgb channel planes",
                    expected: (w, h),
                    actual: plane.dims(),
                });
            }
        }
        let data = (0..w * h)
            .map(|i| [planes[0].data[i], planes[1].data[i], planes[2].data[i]])
            .collect();
        Ok(Self { w, h, data })
    }

    /// Luminance plane used for edge detection, optical flow and bilateral
    /// guidance.
    pub fn luminance(&self) -> ImageF32 {
        ImageF32 {
            w: self.w,
            h: self.h,
            stride: self.w,
            data: self
                .data
                .iter()
                .map(|p| LUMA[0] * p[0] + LUMA[1] * p[1] + LUMA[2] * p[2])
                .collect(),
        }
    }
}

impl crate::image::traits::ImageView for ImageRgbF32 {
    type Pixel = [f32; 3];

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[[f32; 3]] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}
