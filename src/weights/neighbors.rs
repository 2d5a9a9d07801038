//! Eight-connected neighbor weights derived from a smoothness field.
use crate::image::ImageF32;
use crate::parallel::for_each_row_mut;

/// Grid direction from a pixel toward one of its eight neighbors.
///
/// `y` grows downward, so `North` is the row above.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// `(dx, dy)` step toward the neighbor.
    #[inline]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        Direction::ALL[(self.index() + 4) % 8]
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Neighbor coordinates of `(x, y)` in a `w × h` grid, `None` when the
    /// step leaves the grid. There is no wrap-around.
    #[inline]
    pub fn neighbor(self, x: usize, y: usize, w: usize, h: usize) -> Option<(usize, usize)> {
        let (dx, dy) = self.offset();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < w && ny < h).then_some((nx, ny))
    }
}

/// Per-direction coupling weights. The weight at `p` toward direction `d` is
/// the smoothness value of the neighbor `q = p + d`, or zero when `q` lies
/// outside the image.
#[derive(Clone, Debug)]
pub struct NeighborWeights {
    fields: [ImageF32; 8],
}

impl NeighborWeights {
    pub fn from_smoothness(smoothness: &ImageF32) -> Self {
        let (w, h) = smoothness.dims();
        let fields = Direction::ALL.map(|dir| {
            let mut field = ImageF32::new(w, h);
            for_each_row_mut(&mut field.data, w, |y, row| {
                for (x, v) in row.iter_mut().enumerate() {
                    *v = dir
                        .neighbor(x, y, w, h)
                        .map_or(0.0, |(nx, ny)| smoothness.get(nx, ny));
                }
            });
            field
        });
        Self { fields }
    }

    pub fn dims(&self) -> (usize, usize) {
        self.fields[0].dims()
    }

    #[inline]
    pub fn field(&self, dir: Direction) -> &ImageF32 {
        &self.fields[dir.index()]
    }

    #[inline]
    pub fn weight(&self, x: usize, y: usize, dir: Direction) -> f32 {
        self.fields[dir.index()].get(x, y)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, &ImageF32)> {
        Direction::ALL.into_iter().zip(self.fields.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_round_trips() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            let (dx, dy) = dir.offset();
            assert_eq!(dir.opposite().offset(), (-dx, -dy));
        }
    }

    #[test]
    fn border_neighbors_have_zero_weight() {
        let sm = ImageF32::filled(3, 3, 0.7);
        let nb = NeighborWeights::from_smoothness(&sm);
        assert_eq!(nb.weight(0, 0, Direction::West), 0.0);
        assert_eq!(nb.weight(0, 0, Direction::NorthEast), 0.0);
        assert_eq!(nb.weight(2, 2, Direction::SouthEast), 0.0);
        assert_eq!(nb.weight(0, 0, Direction::SouthEast), 0.7);
        assert_eq!(nb.weight(1, 1, Direction::North), 0.7);
    }

    #[test]
    fn weight_is_neighbor_smoothness() {
        let sm = ImageF32::from_fn(4, 3, |x, y| (x + 4 * y) as f32 / 12.0);
        let nb = NeighborWeights::from_smoothness(&sm);
        assert_eq!(nb.weight(1, 1, Direction::East), sm.get(2, 1));
        assert_eq!(nb.weight(1, 1, Direction::SouthWest), sm.get(0, 2));
        assert_eq!(nb.weight(3, 0, Direction::East), 0.0);
    }
}
