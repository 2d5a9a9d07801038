//! I/O helpers for frame images and JSON.
//!
//! - `load_rgb_image` / `load_gray_image`: decode PNG/JPEG/etc. into `[0, 1]` floats.
//! - `save_gray_f32` / `save_rgb_f32`: write float images as 8-bit PNGs.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{ImageF32, ImageRgbF32};
use crate::error::RegularizeError;
use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::Serialize;
use std::fs;
use std::path::Path;

fn io_error(path: &Path, reason: impl ToString) -> RegularizeError {
    RegularizeError::Io {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Load an image from disk as RGB in `[0, 1]`.
pub fn load_rgb_image(path: &Path) -> Result<ImageRgbF32, RegularizeError> {
    let img = image::open(path)
        .map_err(|e| io_error(path, format!("failed to open: {e}")))?
        .into_rgb32f();
    let w = img.width() as usize;
    let h = img.height() as usize;
    let data = img
        .pixels()
        .map(|p| [p[0].clamp(0.0, 1.0), p[1].clamp(0.0, 1.0), p[2].clamp(0.0, 1.0)])
        .collect();
    ImageRgbF32::from_vec(w, h, data)
}

/// Load an image from disk and convert to single-channel `[0, 1]`.
///
/// Depth videos are often stored as 3-channel frames with identical channels;
/// the first channel is used in that case.
pub fn load_gray_image(path: &Path) -> Result<ImageF32, RegularizeError> {
    let img = image::open(path).map_err(|e| io_error(path, format!("failed to open: {e}")))?;
    let w = img.width() as usize;
    let h = img.height() as usize;
    let data = if img.color().has_color() {
        img.into_rgb32f().pixels().map(|p| p[0].clamp(0.0, 1.0)).collect()
    } else {
        img.into_luma16()
            .pixels()
            .map(|p| p[0] as f32 / u16::MAX as f32)
            .collect()
    };
    ImageF32::from_vec(w, h, data)
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Save a float image to a grayscale PNG, clamping values to `[0, 1]`.
pub fn save_gray_f32(image: &ImageF32, path: &Path) -> Result<(), RegularizeError> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(image.w as u32, image.h as u32);
    for y in 0..image.h {
        for x in 0..image.w {
            out.put_pixel(x as u32, y as u32, Luma([to_u8(image.get(x, y))]));
        }
    }
    out.save(path)
        .map_err(|e| io_error(path, format!("failed to save: {e}")))
}

/// Save an RGB float image to an 8-bit PNG.
pub fn save_rgb_f32(image: &ImageRgbF32, path: &Path) -> Result<(), RegularizeError> {
    ensure_parent_dir(path)?;
    let mut out = RgbImage::new(image.w as u32, image.h as u32);
    for y in 0..image.h {
        for x in 0..image.w {
            let [r, g, b] = image.get(x, y);
            out.put_pixel(x as u32, y as u32, Rgb([to_u8(r), to_u8(g), to_u8(b)]));
        }
    }
    out.save(path)
        .map_err(|e| io_error(path, format!("failed to save: {e}")))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), RegularizeError> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io_error(path, format!("failed to serialize JSON: {e}")))?;
    fs::write(path, json).map_err(|e| io_error(path, format!("failed to write JSON: {e}")))
}

fn ensure_parent_dir(path: &Path) -> Result<(), RegularizeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| io_error(parent, format!("failed to create directory: {e}")))?;
        }
    }
    Ok(())
}
