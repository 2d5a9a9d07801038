//! Row-parallel assembly of the per-frame system.
use super::{LinearSystem, SparseMatrix, TemporalTerm};
use crate::config::{SolverConfig, TemporalWeighting};
use crate::error::RegularizeError;
use crate::image::ImageF32;
use crate::parallel::for_each_row_mut;
use crate::weights::{Direction, WeightMaps};
use log::debug;
use nalgebra::DVector;

/// Directions in increasing column order of the neighbor in a row-major grid.
/// The diagonal sits between `West` and `East`.
const BEFORE_DIAG: [Direction; 4] = [
    Direction::NorthWest,
    Direction::North,
    Direction::NorthEast,
    Direction::West,
];
const AFTER_DIAG: [Direction; 4] = [
    Direction::East,
    Direction::SouthWest,
    Direction::South,
    Direction::SouthEast,
];

/// One assembled matrix row plus its right-hand side entry.
#[derive(Clone, Copy)]
struct PixelRow {
    entries: [(usize, f64); 9],
    len: usize,
    rhs: f64,
}

impl Default for PixelRow {
    fn default() -> Self {
        Self {
            entries: [(0, 0.0); 9],
            len: 0,
            rhs: 0.0,
        }
    }
}

impl PixelRow {
    #[inline]
    fn push(&mut self, col: usize, value: f64) {
        self.entries[self.len] = (col, value);
        self.len += 1;
    }

    fn entries(&self) -> &[(usize, f64)] {
        &self.entries[..self.len]
    }
}

fn check_dims(
    context: &'static str,
    expected: (usize, usize),
    actual: (usize, usize),
) -> Result<(), RegularizeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(RegularizeError::ShapeMismatch {
            context,
            expected,
            actual,
        })
    }
}

/// Build `A x = b` for one frame.
///
/// With [`TemporalTerm::None`] the temporal weight is zero everywhere, which
/// is the same system as an anchor with `gamma = 0`.
pub fn build_system(
    weights: &WeightMaps,
    depth: &ImageF32,
    config: &SolverConfig,
    temporal: TemporalTerm<'_>,
) -> Result<LinearSystem, RegularizeError> {
    let (w, h) = depth.dims();
    check_dims("system (weights vs depth)", (w, h), weights.dims())?;
    check_dims("system (neighbors vs depth)", (w, h), weights.neighbors.dims())?;
    let (gamma, prior) = match temporal {
        TemporalTerm::None => (0.0, None),
        TemporalTerm::Anchor { warped_prior } => {
            check_dims("system (prior vs depth)", (w, h), warped_prior.dims())?;
            (config.gamma as f64, Some(warped_prior))
        }
    };
    let lambda = config.lambda_data as f64;
    let s = config.smoothness as f64;

    let mut rows = vec![PixelRow::default(); w * h];
    for_each_row_mut(&mut rows, w, |y, out| {
        for (x, row) in out.iter_mut().enumerate() {
            let p = y * w + x;
            let lambda_p = lambda * weights.data.get(x, y) as f64;
            let gamma_p = match config.temporal_weighting {
                TemporalWeighting::Uniform => gamma,
                TemporalWeighting::EdgeAware => gamma * weights.robust.get(x, y) as f64,
            };

            let coupling = |dir: Direction| -> Option<(usize, f64)> {
                let (qx, qy) = dir.neighbor(x, y, w, h)?;
                let w_pq = weights.neighbors.weight(x, y, dir);
                let w_qp = weights.neighbors.weight(qx, qy, dir.opposite());
                Some((qy * w + qx, s * w_pq.min(w_qp) as f64))
            };

            let mut off_sum = 0.0;
            for dir in BEFORE_DIAG {
                if let Some((q, c)) = coupling(dir) {
                    row.push(q, -c);
                    off_sum += c;
                }
            }
            row.push(p, 0.0);
            let diag_slot = row.len - 1;
            for dir in AFTER_DIAG {
                if let Some((q, c)) = coupling(dir) {
                    row.push(q, -c);
                    off_sum += c;
                }
            }
            row.entries[diag_slot].1 = lambda_p + gamma_p + off_sum;

            let anchor = prior.map_or(0.0, |pr| gamma_p * pr.get(x, y) as f64);
            row.rhs = lambda_p * depth.get(x, y) as f64 + anchor;
        }
    });

    for (p, row) in rows.iter().enumerate() {
        let diag = row
            .entries()
            .iter()
            .find(|(c, _)| *c == p)
            .map_or(0.0, |&(_, v)| v);
        if !(diag.is_finite() && diag > 0.0) || !row.rhs.is_finite() {
            return Err(RegularizeError::SingularSystem { pixel: p });
        }
    }

    let rhs = DVector::from_iterator(rows.len(), rows.iter().map(|r| r.rhs));
    let matrix = SparseMatrix::from_rows(rows.iter().map(PixelRow::entries));
    debug!(
        "system: n = {}, nnz = {}, gamma = {gamma}",
        matrix.n(),
        matrix.nnz()
    );
    Ok(LinearSystem {
        matrix,
        rhs,
        width: w,
        height: h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeightOptions;
    use crate::image::ImageRgbF32;
    use crate::weights::compute_weight_maps;

    fn frame(w: usize, h: usize) -> (ImageRgbF32, ImageF32) {
        let depth = ImageF32::from_fn(w, h, |x, y| 0.3 + 0.01 * x as f32 + 0.02 * y as f32);
        let rgb = ImageRgbF32::from_fn(w, h, |x, y| {
            let v = ((x + y) % 3) as f32 / 3.0;
            [v, v, v]
        });
        (rgb, depth)
    }

    #[test]
    fn matrix_is_symmetric_with_bounded_rows() {
        let (rgb, depth) = frame(5, 4);
        let maps = compute_weight_maps(&rgb, &depth, &WeightOptions::default()).unwrap();
        let sys = build_system(&maps, &depth, &SolverConfig::default(), TemporalTerm::None).unwrap();
        assert_eq!(sys.matrix.n(), 20);
        assert_eq!(sys.matrix.max_asymmetry(), 0.0);
        for p in 0..20 {
            let (cols, _) = sys.matrix.row(p);
            assert!(cols.len() <= 9);
            assert!(cols.windows(2).all(|c| c[0] < c[1]));
        }
        // corner pixel: itself plus three neighbors
        assert_eq!(sys.matrix.row(0).0, &[0, 1, 5, 6]);
    }

    #[test]
    fn zero_gamma_anchor_equals_no_temporal_term() {
        let (rgb, depth) = frame(6, 5);
        let maps = compute_weight_maps(&rgb, &depth, &WeightOptions::default()).unwrap();
        let prior = depth.map(|v| v + 0.1);
        let cfg = SolverConfig {
            gamma: 0.0,
            ..SolverConfig::default()
        };
        let a = build_system(&maps, &depth, &cfg, TemporalTerm::None).unwrap();
        let b = build_system(&maps, &depth, &cfg, TemporalTerm::Anchor { warped_prior: &prior })
            .unwrap();
        assert_eq!(a.matrix, b.matrix);
        assert_eq!(a.rhs, b.rhs);
    }

    /// Temporal contribution to the diagonal of row `p`.
    fn temporal_diagonal(sys: &LinearSystem, maps: &WeightMaps, cfg: &SolverConfig, p: usize) -> f64 {
        let (cols, vals) = sys.matrix.row(p);
        let mut diag = 0.0;
        let mut off = 0.0;
        for (&c, &v) in cols.iter().zip(vals) {
            if c == p {
                diag = v;
            } else {
                off -= v;
            }
        }
        let (x, y) = (p % sys.width, p / sys.width);
        diag - off - cfg.lambda_data as f64 * maps.data.get(x, y) as f64
    }

    #[test]
    fn temporal_weighting_controls_gamma_per_pixel() {
        let (rgb, depth) = frame(6, 5);
        let maps = compute_weight_maps(&rgb, &depth, &WeightOptions::default()).unwrap();
        let prior = depth.map(|v| v + 0.1);
        let anchor = TemporalTerm::Anchor { warped_prior: &prior };
        let uniform = SolverConfig {
            gamma: 0.5,
            ..SolverConfig::default()
        };
        let edge_aware = SolverConfig {
            temporal_weighting: TemporalWeighting::EdgeAware,
            ..uniform.clone()
        };
        let a = build_system(&maps, &depth, &uniform, anchor).unwrap();
        let b = build_system(&maps, &depth, &edge_aware, anchor).unwrap();
        for p in 0..30 {
            let robust = maps.robust.get(p % 6, p / 6) as f64;
            assert!((temporal_diagonal(&a, &maps, &uniform, p) - 0.5).abs() < 1e-9);
            assert!((temporal_diagonal(&b, &maps, &edge_aware, p) - 0.5 * robust).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_weights_are_singular() {
        let (rgb, depth) = frame(3, 3);
        let maps = compute_weight_maps(&rgb, &depth, &WeightOptions::default()).unwrap();
        let cfg = SolverConfig {
            lambda_data: 0.0,
            gamma: 0.0,
            smoothness: 0.0,
            ..SolverConfig::default()
        };
        let err = build_system(&maps, &depth, &cfg, TemporalTerm::None).unwrap_err();
        assert!(matches!(err, RegularizeError::SingularSystem { pixel: 0 }));
    }

    #[test]
    fn prior_size_is_checked() {
        let (rgb, depth) = frame(4, 4);
        let maps = compute_weight_maps(&rgb, &depth, &WeightOptions::default()).unwrap();
        let prior = ImageF32::new(3, 4);
        let err = build_system(
            &maps,
            &depth,
            &SolverConfig::default(),
            TemporalTerm::Anchor { warped_prior: &prior },
        )
        .unwrap_err();
        assert!(matches!(err, RegularizeError::ShapeMismatch { .. }));
    }
}
