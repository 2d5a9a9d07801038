//! Owned float image buffers and the small set of geometric helpers the
//! regularizer needs (bilinear sampling, resizing, equirectangular padding).
//!
//! All buffers are row-major with `stride == w`. Values are normalised to
//! `[0, 1]` by convention; nothing here enforces it.

pub mod f32;
pub mod io;
pub mod pad;
pub mod resize;
pub mod rgb;
pub mod sample;
pub mod traits;

pub use self::f32::ImageF32;
pub use self::rgb::ImageRgbF32;
pub use self::sample::sample_bilinear;
pub use self::traits::{ImageView, ImageViewMut};
