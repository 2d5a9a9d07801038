//! Small-window median filter with replicated borders.
use crate::image::{ImageF32, ImageView};
use crate::parallel::for_each_row_mut;

/// Median over a `size × size` window (`size` rounded up to odd; `<= 1`
/// returns a copy).
pub fn median_filter(img: &ImageF32, size: usize) -> ImageF32 {
    if size <= 1 || img.is_empty() {
        return img.clone();
    }
    let radius = ((size | 1) / 2) as isize;
    let (w, h) = img.dims();
    let mut out = ImageF32::new(w, h);
    for_each_row_mut(&mut out.data, w, |y, dst| {
        let mut window = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        for (x, px) in dst.iter_mut().enumerate() {
            window.clear();
            for dy in -radius..=radius {
                let sy = (y as isize + dy).clamp(0, h as isize - 1) as usize;
                let row = img.row(sy);
                for dx in -radius..=radius {
                    let sx = (x as isize + dx).clamp(0, w as isize - 1) as usize;
                    window.push(row[sx]);
                }
            }
            let mid = window.len() / 2;
            window.select_nth_unstable_by(mid, f32::total_cmp);
            *px = window[mid];
        }
    });
    out
}
