use super::filters::{SeparableFilter, StaticSeparableFilter, GAUSSIAN_5TAP};

/// Options controlling pyramid construction.
#[derive(Clone, Copy)]
pub struct PyramidOptions {
    /// Size ratio between consecutive levels, in `(0, 1)`.
    pub ratio: f32,
    /// Stop before a level would become narrower than this many pixels.
    pub min_width: usize,
    /// Hard cap on the number of levels (>= 1).
    pub max_levels: usize,
    /// Filter applied before each downscale.
    pub filter: StaticSeparableFilter,
}

impl Default for PyramidOptions {
    fn default() -> Self {
        Self {
            ratio: 0.5,
            min_width: 16,
            max_levels: 8,
            filter: GAUSSIAN_5TAP,
        }
    }
}

impl PyramidOptions {
    pub fn new(ratio: f32, min_width: usize) -> Self {
        Self {
            ratio,
            min_width,
            ..Self::default()
        }
    }

    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }
}

impl std::fmt::Debug for PyramidOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PyramidOptions")
            .field("ratio", &self.ratio)
            .field("min_width", &self.min_width)
            .field("max_levels", &self.max_levels)
            .field("filter_taps", &self.filter.taps().len())
            .finish()
    }
}
