/// Row-major pixel access shared by the single- and three-channel buffers.
pub trait ImageView {
    type Pixel: Copy;

    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Pixels of row `y`, exactly `width()` long.
    fn row(&self, y: usize) -> &[Self::Pixel];
}

pub trait ImageViewMut: ImageView {
    fn row_mut(&mut self, y: usize) -> &mut [Self::Pixel];
}
