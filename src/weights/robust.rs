//! Robust weighting of the edge map.
use crate::config::EdgeWeightShape;
use crate::image::ImageF32;
use crate::pyramid::filters::box_filter;

/// Map an edge strength to a weight in `[0, 1]`; strong edges get small
/// weights.
#[inline]
pub fn robust_weight(edge: f32, shape: EdgeWeightShape) -> f32 {
    match shape {
        EdgeWeightShape::Tukey { cutoff } => {
            let e = edge.abs();
            if e <= cutoff {
                let t = 1.0 - (e / cutoff) * (e / cutoff);
                t * t
            } else {
                0.0
            }
        }
        EdgeWeightShape::Exponential { sigma } => (-edge.abs() / sigma).exp(),
    }
}

/// Apply [`robust_weight`] per pixel, then average over a `window × window`
/// box.
pub fn robust_weight_map(edge: &ImageF32, shape: EdgeWeightShape, window: usize) -> ImageF32 {
    let raw = edge.map(|e| robust_weight(e, shape));
    let mut out = box_filter(&raw, window);
    out.clip01();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tukey_values() {
        let shape = EdgeWeightShape::Tukey { cutoff: 2.0 };
        assert_eq!(robust_weight(0.0, shape), 1.0);
        assert!((robust_weight(1.0, shape) - 0.5625).abs() < 1e-6);
        assert_eq!(robust_weight(2.0, shape), 0.0);
        assert_eq!(robust_weight(3.0, shape), 0.0);
    }

    #[test]
    fn exponential_decays() {
        let shape = EdgeWeightShape::Exponential { sigma: 0.1 };
        assert_eq!(robust_weight(0.0, shape), 1.0);
        assert!((robust_weight(0.1, shape) - (-1.0f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn map_is_averaged_and_bounded() {
        let edge = ImageF32::from_fn(5, 5, |x, _| if x == 2 { 1.0 } else { 0.0 });
        let shape = EdgeWeightShape::Exponential { sigma: 0.1 };
        let map = robust_weight_map(&edge, shape, 3);
        assert!(map.data.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(map.get(2, 2) < map.get(0, 2));
        assert!(map.get(2, 2) > robust_weight(1.0, shape));
    }
}
