//! Right-preconditioned BiCGSTAB.
use super::ops::{axpy, dot, residual, spmv, xpby};
use super::{Iteration, Preconditioned};
use crate::system::LinearSystem;
use nalgebra::DVector;

pub(super) fn bicgstab(
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
    let r_hat = r.clone();

    let mut p = DVector::<f64>::zeros(n);
    let mut v = DVector::<f64>::zeros(n);
    let mut p_hat = DVector::zeros(n);
    let mut s_hat = DVector::zeros(n);
    let mut t = DVector::zeros(n);
    let (mut rho_prev, mut alpha, mut omega) = (1.0f64, 1.0f64, 1.0f64);

    for k in 0..max_iterations {
        let rho = dot(r_hat.as_slice(), r.as_slice());
        if !(rho.is_finite() && rho != 0.0) {
            break;
        }
        if k == 0 {
            p.copy_from(&r);
        } else {
            let beta = (rho / rho_prev) * (alpha / omega);
            // p = r + beta (p - omega v)
            axpy(-omega, v.as_slice(), p.as_mut_slice());
            xpby(r.as_slice(), beta, p.as_mut_slice());
        }

        precond.apply(p.as_slice(), p_hat.as_mut_slice());
        spmv(a, p_hat.as_slice(), v.as_mut_slice());
        let rv = dot(r_hat.as_slice(), v.as_slice());
        if !(rv.is_finite() && rv != 0.0) {
            break;
        }
        alpha = rho / rv;
        axpy(alpha, p_hat.as_slice(), x.as_mut_slice());
        // r becomes s = r - alpha v
        axpy(-alpha, v.as_slice(), r.as_mut_slice());

        precond.apply(r.as_slice(), s_hat.as_mut_slice());
        spmv(a, s_hat.as_slice(), t.as_mut_slice());
        let tt = dot(t.as_slice(), t.as_slice());
        omega = if tt > 0.0 {
            dot(t.as_slice(), r.as_slice()) / tt
        } else {
            0.0
        };
        if omega != 0.0 && omega.is_finite() {
            axpy(omega, s_hat.as_slice(), x.as_mut_slice());
            axpy(-omega, t.as_slice(), r.as_mut_slice());
        }
        if tracker.record(system, x) || !(omega.is_finite() && omega != 0.0) {
            break;
        }
        rho_prev = rho;
    }
}
