//! Row- and chunk-parallel helpers.
//!
//! With the `parallel` feature the closures run on the rayon pool; without it
//! the same closures run in order on the calling thread. Work is split into
//! the same pieces either way, so per-row and per-chunk results are identical.

/// Chunk length used by reductions. Partial sums are formed per chunk and
/// combined in chunk order, which keeps results independent of thread count.
pub(crate) const REDUCE_CHUNK: usize = 4096;

/// Run `f(y, row)` for every row of a row-major buffer of width `w`.
pub(crate) fn for_each_row_mut<T, F>(data: &mut [T], w: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    if w == 0 {
        return;
    }
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        data.par_chunks_mut(w)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }
    #[cfg(not(feature = "parallel"))]
    {
        data.chunks_mut(w).enumerate().for_each(|(y, row)| f(y, row));
    }
}

/// Evaluate `f(chunk_index)` for `0..n_chunks` and collect the results in order.
pub(crate) fn map_chunks<R, F>(n_chunks: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..n_chunks).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..n_chunks).map(f).collect()
    }
}
