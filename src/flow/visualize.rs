//! Colour coding of flow fields: hue encodes direction, value encodes
//! magnitude relative to the field maximum.
use super::FlowField;
use crate::image::ImageRgbF32;
use std::f32::consts::PI;

pub fn flow_to_rgb(flow: &FlowField) -> ImageRgbF32 {
    let (w, h) = flow.dims();
    let max = flow.stats().max_magnitude;
    let scale = if max > 0.0 { 1.0 / max } else { 1.0 };
    ImageRgbF32::from_fn(w, h, |x, y| {
        let (u, v) = flow.get(x, y);
        let mag = (u * u + v * v).sqrt();
        let angle = v.atan2(u).rem_euclid(2.0 * PI);
        hsv_to_rgb(angle / (2.0 * PI), 1.0, (mag * scale).clamp(0.0, 1.0))
    })
}

/// `h`, `s`, `v` in `[0, 1]`.
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let h6 = (h * 6.0).rem_euclid(6.0);
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_flow_is_black() {
        let rgb = flow_to_rgb(&FlowField::zeros(3, 2));
        assert!(rgb.data.iter().all(|px| *px == [0.0, 0.0, 0.0]));
    }

    #[test]
    fn rightward_flow_is_red() {
        let rgb = flow_to_rgb(&FlowField::uniform(2, 2, 2.0, 0.0));
        let [r, g, b] = rgb.get(0, 0);
        assert!((r - 1.0).abs() < 1e-6 && g.abs() < 1e-6 && b.abs() < 1e-6);
    }
}
