//! Preconditioned conjugate gradient.
use super::ops::{axpy, dot, residual, spmv, xpby};
use super::{Iteration, Preconditioned};
use crate::system::LinearSystem;
use nalgebra::DVector;

pub(super) fn conjugate_gradient(
    system: &LinearSystem,
    precond: &Preconditioned,
    x: &mut DVector<f64>,
    max_iterations: usize,
    tracker: &mut Iteration,
) {
    let a = &system.matrix;
    let n = a.n();
    let mut r = DVector::zeros(n);
    residual(a, system.rhs.as_slice(), x.as_slice(), r.as_mut_slice());
    let mut z = DVector::zeros(n);
    precond.apply(r.as_slice(), z.as_mut_slice());
    let mut p = z.clone();
    let mut ap = DVector::zeros(n);
    let mut rz = dot(r.as_slice(), z.as_slice());

    for _ in 0..max_iterations {
        spmv(a, p.as_slice(), ap.as_mut_slice());
        let pap = dot(p.as_slice(), ap.as_slice());
        if !(pap.is_finite() && pap > 0.0) {
            break;
        }
        let alpha = rz / pap;
        axpy(alpha, p.as_slice(), x.as_mut_slice());
        axpy(-alpha, ap.as_slice(), r.as_mut_slice());
        if tracker.record(system, x) {
            break;
        }

        precond.apply(r.as_slice(), z.as_mut_slice());
        let rz_next = dot(r.as_slice(), z.as_slice());
        if !(rz_next.is_finite() && rz != 0.0) {
            break;
        }
        xpby(z.as_slice(), rz_next / rz, p.as_mut_slice());
        rz = rz_next;
    }
}
