//! Backward warping of a scalar field through a flow field.
use super::FlowField;
use crate::error::RegularizeError;
use crate::image::{sample_bilinear, ImageF32};
use crate::parallel::for_each_row_mut;

/// Resample `field` at `(x + dx, y + dy)` for every pixel, bilinearly, with
/// the sample position clamped to the image. Zero flow reproduces `field`
/// exactly.
pub fn warp_with_flow(field: &ImageF32, flow: &FlowField) -> Result<ImageF32, RegularizeError> {
    if field.dims() != flow.dims() {
        return Err(RegularizeError::ShapeMismatch {
            context: "flow warp",
            expected: field.dims(),
            actual: flow.dims(),
        });
    }
    let (w, h) = field.dims();
    let mut out = ImageF32::new(w, h);
    for_each_row_mut(&mut out.data, w, |y, row| {
        for (x, v) in row.iter_mut().enumerate() {
            let (dx, dy) = flow.get(x, y);
            *v = sample_bilinear(field, x as f32 + dx, y as f32 + dy);
        }
    });
    Ok(out)
}
