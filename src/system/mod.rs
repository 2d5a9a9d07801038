//! Sparse linear system of one frame.
//!
//! Minimising
//!
//! ```text
//! Σ_p λ_p (x_p − d_p)² + γ_p (x_p − d'_p)² + s · Σ_{p~q} c_pq (x_p − x_q)²
//! ```
//!
//! over the depth `x` gives `A x = b` with `A = D + Γ + L`: the data and
//! temporal diagonals plus a weighted graph Laplacian over the 8-connected
//! grid. The coupling `c_pq = min(w_pq, w_qp)` is shared by both endpoints, so
//! `A` is symmetric and, with a positive diagonal, positive definite.

pub mod builder;

pub use builder::build_system;

use crate::error::RegularizeError;
use crate::image::ImageF32;
use nalgebra::DVector;

/// Square matrix in compressed sparse row form. Column indices are sorted
/// within each row.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    n: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    /// Assemble from per-row `(column, value)` lists. Columns must be sorted
    /// and `< rows.len()`.
    pub fn from_rows<R>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: AsRef<[(usize, f64)]>,
    {
        let mut row_ptr = vec![0];
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        for row in rows {
            for &(c, v) in row.as_ref() {
                col_idx.push(c);
                values.push(v);
            }
            row_ptr.push(col_idx.len());
        }
        Self {
            n: row_ptr.len() - 1,
            row_ptr,
            col_idx,
            values,
        }
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column indices and values of row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let span = self.row_ptr[i]..self.row_ptr[i + 1];
        (&self.col_idx[span.clone()], &self.values[span])
    }

    /// Entry `(i, j)`, zero when not stored.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (cols, vals) = self.row(i);
        cols.binary_search(&j).map_or(0.0, |k| vals[k])
    }

    pub fn diagonal(&self) -> DVector<f64> {
        DVector::from_fn(self.n, |i, _| self.get(i, i))
    }

    /// Largest `|A_ij − A_ji|` over stored entries.
    pub fn max_asymmetry(&self) -> f64 {
        (0..self.n)
            .flat_map(|i| {
                let (cols, vals) = self.row(i);
                cols.iter()
                    .zip(vals)
                    .map(move |(&j, &v)| (v - self.get(j, i)).abs())
            })
            .fold(0.0, f64::max)
    }
}

/// `A x = b` for one frame of size `width × height`, pixels in row-major
/// order.
#[derive(Clone, Debug)]
pub struct LinearSystem {
    pub matrix: SparseMatrix,
    pub rhs: DVector<f64>,
    pub width: usize,
    pub height: usize,
}

impl LinearSystem {
    /// Reshape a solution vector into an image.
    pub fn to_image(&self, x: &DVector<f64>) -> Result<ImageF32, RegularizeError> {
        ImageF32::from_vec(
            self.width,
            self.height,
            x.iter().map(|&v| v as f32).collect(),
        )
    }
}

/// Temporal coupling of a frame to its predecessor.
#[derive(Clone, Copy, Debug)]
pub enum TemporalTerm<'a> {
    /// First frame: no temporal term.
    None,
    /// Pull toward the previous depth warped into this frame, weighted per
    /// pixel as selected by `SolverConfig::temporal_weighting`.
    Anchor { warped_prior: &'a ImageF32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csr_lookup() {
        let m = SparseMatrix::from_rows(vec![
            vec![(0, 2.0), (1, -1.0)],
            vec![(0, -1.0), (1, 2.0), (2, -0.5)],
            vec![(1, -0.5), (2, 1.0)],
        ]);
        assert_eq!(m.n(), 3);
        assert_eq!(m.nnz(), 7);
        assert_eq!(m.get(1, 2), -0.5);
        assert_eq!(m.get(0, 2), 0.0);
        assert_eq!(m.diagonal().as_slice(), &[2.0, 2.0, 1.0]);
        assert_eq!(m.max_asymmetry(), 0.0);
    }
}
