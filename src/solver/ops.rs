//! Vector kernels used by the iterative solvers.
//!
//! Every kernel splits its input into `REDUCE_CHUNK`-sized pieces. Reductions
//! form one partial sum per chunk and add the partials in chunk order, so a
//! result never depends on how many threads ran the chunks.
use crate::parallel::{for_each_row_mut, map_chunks, REDUCE_CHUNK};
use crate::system::SparseMatrix;
use std::ops::Range;

#[inline]
fn chunk_range(c: usize, n: usize) -> Range<usize> {
    c * REDUCE_CHUNK..((c + 1) * REDUCE_CHUNK).min(n)
}

/// `a · b`.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len();
    map_chunks(n.div_ceil(REDUCE_CHUNK), |c| {
        let r = chunk_range(c, n);
        a[r.clone()].iter().zip(&b[r]).map(|(x, y)| x * y).sum::<f64>()
    })
    .into_iter()
    .sum()
}

pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// `y = A x`.
pub fn spmv(m: &SparseMatrix, x: &[f64], y: &mut [f64]) {
    for_each_row_mut(y, REDUCE_CHUNK, |c, out| {
        let base = c * REDUCE_CHUNK;
        for (k, yi) in out.iter_mut().enumerate() {
            let (cols, vals) = m.row(base + k);
            *yi = cols.iter().zip(vals).map(|(&j, v)| v * x[j]).sum();
        }
    });
}

/// `r = b − A x`.
pub fn residual(m: &SparseMatrix, b: &[f64], x: &[f64], r: &mut [f64]) {
    for_each_row_mut(r, REDUCE_CHUNK, |c, out| {
        let base = c * REDUCE_CHUNK;
        for (k, ri) in out.iter_mut().enumerate() {
            let (cols, vals) = m.row(base + k);
            let ax: f64 = cols.iter().zip(vals).map(|(&j, v)| v * x[j]).sum();
            *ri = b[base + k] - ax;
        }
    });
}

/// `y += alpha · x`.
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for_each_row_mut(y, REDUCE_CHUNK, |c, out| {
        let base = c * REDUCE_CHUNK;
        for (k, yi) in out.iter_mut().enumerate() {
            *yi += alpha * x[base + k];
        }
    });
}

/// `y = x + beta · y`.
pub fn xpby(x: &[f64], beta: f64, y: &mut [f64]) {
    for_each_row_mut(y, REDUCE_CHUNK, |c, out| {
        let base = c * REDUCE_CHUNK;
        for (k, yi) in out.iter_mut().enumerate() {
            *yi = x[base + k] + beta * *yi;
        }
    });
}

/// `y = d ⊙ x` (elementwise product).
pub fn hadamard(d: &[f64], x: &[f64], y: &mut [f64]) {
    for_each_row_mut(y, REDUCE_CHUNK, |c, out| {
        let base = c * REDUCE_CHUNK;
        for (k, yi) in out.iter_mut().enumerate() {
            *yi = d[base + k] * x[base + k];
        }
    });
}
