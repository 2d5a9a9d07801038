//! 256-bin histogram equalisation for `[0, 1]` float images.
//!
//! Values are quantised to 8 bits (clamped), equalised through the cumulative
//! histogram and mapped back to `[0, 1]`. A constant image maps to all zeros.
use crate::image::ImageF32;

const BINS: usize = 256;

#[inline]
fn quantize(v: f32) -> usize {
    (v.clamp(0.0, 1.0) * 255.0).round() as usize
}

pub fn equalize_histogram(img: &ImageF32) -> ImageF32 {
    let mut out = ImageF32::new(img.w, img.h);
    let n = img.len();
    if n == 0 {
        return out;
    }
    let mut hist = [0usize; BINS];
    for &v in &img.data {
        hist[quantize(v)] += 1;
    }
    let mut cdf = [0usize; BINS];
    let mut acc = 0usize;
    for (c, &count) in cdf.iter_mut().zip(&hist) {
        acc += count;
        *c = acc;
    }
    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    let denom = n - cdf_min;
    if denom == 0 {
        return out;
    }
    let lut: Vec<f32> = cdf
        .iter()
        .map(|&c| {
            let level = (c.saturating_sub(cdf_min) as f32 * 255.0 / denom as f32).round();
            level / 255.0
        })
        .collect();
    for (dst, &v) in out.data.iter_mut().zip(&img.data) {
        *dst = lut[quantize(v)];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_image_maps_to_zero() {
        let img = ImageF32::filled(4, 4, 0.3);
        assert!(equalize_histogram(&img).data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn spreads_values_to_full_range() {
        let img = ImageF32::from_fn(4, 1, |x, _| 0.4 + 0.01 * x as f32);
        let eq = equalize_histogram(&img);
        assert_eq!(eq.get(0, 0), 0.0);
        assert!((eq.get(3, 0) - 1.0).abs() < 1e-6);
        assert!(eq.data.windows(2).all(|p| p[0] <= p[1]));
    }
}
