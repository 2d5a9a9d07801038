//! Joint bilateral refinement of the solved depth.
//!
//! Each output pixel is a normalised average of the depth in a square window,
//! weighted by spatial distance and by the luminance difference in the RGB
//! guide. Depth discontinuities that coincide with image edges stay sharp.
use crate::config::BilateralOptions;
use crate::error::RegularizeError;
use crate::image::{ImageF32, ImageRgbF32};
use crate::parallel::for_each_row_mut;

pub fn joint_bilateral_filter(
    depth: &ImageF32,
    guide: &ImageRgbF32,
    options: &BilateralOptions,
) -> Result<ImageF32, RegularizeError> {
    if depth.dims() != guide.dims() {
        return Err(RegularizeError::ShapeMismatch {
            context: "bilateral guide",
            expected: depth.dims(),
            actual: guide.dims(),
        });
    }
    let mut out = depth.clone();
    if options.enabled && options.radius > 0 && !depth.is_empty() {
        let luma = guide.luminance();
        let r = options.radius as isize;
        let side = 2 * options.radius + 1;
        let inv_space = -0.5 / (options.sigma_space * options.sigma_space);
        let inv_range = -0.5 / (options.sigma_range * options.sigma_range);
        let spatial: Vec<f32> = (0..side * side)
            .map(|k| {
                let dx = (k % side) as f32 - r as f32;
                let dy = (k / side) as f32 - r as f32;
                ((dx * dx + dy * dy) * inv_space).exp()
            })
            .collect();
        let (w, h) = depth.dims();

        for_each_row_mut(&mut out.data, w, |y, row| {
            for (x, v) in row.iter_mut().enumerate() {
                let center = luma.get(x, y);
                let (mut acc, mut norm) = (0.0f32, 0.0f32);
                for dy in -r..=r {
                    let Some(sy) = y.checked_add_signed(dy).filter(|&sy| sy < h) else {
                        continue;
                    };
                    for dx in -r..=r {
                        let Some(sx) = x.checked_add_signed(dx).filter(|&sx| sx < w) else {
                            continue;
                        };
                        let diff = luma.get(sx, sy) - center;
                        let k = ((dy + r) as usize) * side + (dx + r) as usize;
                        let wgt = spatial[k] * (diff * diff * inv_range).exp();
                        acc += wgt * depth.get(sx, sy);
                        norm += wgt;
                    }
                }
                if norm > 0.0 {
                    *v = acc / norm;
                }
            }
        });
    }
    out.clip01();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_depth_is_preserved() {
        let depth = ImageF32::filled(9, 7, 0.42);
        let guide = ImageRgbF32::from_fn(9, 7, |x, y| {
            let v = ((x * y) % 4) as f32 / 4.0;
            [v, v, v]
        });
        let out = joint_bilateral_filter(&depth, &guide, &BilateralOptions::default()).unwrap();
        assert!(out.data.iter().all(|v| (v - 0.42).abs() < 1e-5));
    }

    #[test]
    fn guide_edge_keeps_depth_edge() {
        let depth = ImageF32::from_fn(12, 6, |x, _| if x < 6 { 0.2 } else { 0.8 });
        let guide = ImageRgbF32::from_fn(12, 6, |x, _| if x < 6 { [0.0; 3] } else { [1.0; 3] });
        let out = joint_bilateral_filter(&depth, &guide, &BilateralOptions::default()).unwrap();
        assert!((out.get(5, 3) - 0.2).abs() < 1e-3);
        assert!((out.get(6, 3) - 0.8).abs() < 1e-3);
    }

    #[test]
    fn output_is_clipped() {
        let depth = ImageF32::from_fn(4, 4, |x, _| x as f32 - 1.0);
        let guide = ImageRgbF32::new(4, 4);
        let opts = BilateralOptions {
            enabled: false,
            ..BilateralOptions::default()
        };
        let out = joint_bilateral_filter(&depth, &guide, &opts).unwrap();
        assert_eq!(out.get(0, 0), 0.0);
        assert_eq!(out.get(3, 0), 1.0);
    }
}
