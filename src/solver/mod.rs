//! Iterative solve of the per-frame system.
//!
//! Both methods run with optional Jacobi preconditioning and stop once the
//! true relative residual `‖b − Ax‖ / ‖b‖` reaches the tolerance or the
//! iteration cap is hit. The iterate with the lowest true residual is kept,
//! so raising the cap never returns a worse answer. Hitting the cap is not
//! an error; the outcome carries a `converged` flag instead.

mod bicgstab;
mod cg;
pub mod ops;

use crate::config::{Preconditioner, SolverConfig, SolverMethod};
use crate::system::LinearSystem;
use log::{debug, warn};
use nalgebra::DVector;
use ops::{hadamard, norm, residual};

#[derive(Clone, Debug)]
pub struct SolveOutcome {
    /// Best iterate seen.
    pub solution: DVector<f64>,
    pub iterations: usize,
    /// True relative residual of `solution`.
    pub relative_residual: f64,
    pub converged: bool,
}

/// Preconditioner in applied form.
pub(crate) enum Preconditioned {
    Identity,
    /// Inverse diagonal.
    Jacobi(DVector<f64>),
}

impl Preconditioned {
    fn new(kind: Preconditioner, system: &LinearSystem) -> Self {
        match kind {
            Preconditioner::None => Preconditioned::Identity,
            Preconditioner::Jacobi => {
                let inv = system.matrix.diagonal().map(|d| {
                    if d.is_finite() && d != 0.0 {
                        1.0 / d
                    } else {
                        1.0
                    }
                });
                Preconditioned::Jacobi(inv)
            }
        }
    }

    /// `z = M⁻¹ r`.
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        match self {
            Preconditioned::Identity => z.copy_from_slice(r),
            Preconditioned::Jacobi(inv) => hadamard(inv.as_slice(), r, z),
        }
    }
}

/// Bookkeeping shared by the methods: counts iterations and keeps the iterate
/// with the lowest true residual.
pub(crate) struct Iteration {
    b_norm: f64,
    tolerance: f64,
    iterations: usize,
    best: DVector<f64>,
    best_residual: f64,
    scratch: DVector<f64>,
}

impl Iteration {
    fn new(system: &LinearSystem, x0: &DVector<f64>, b_norm: f64, tolerance: f64) -> Self {
        let mut scratch = DVector::zeros(x0.len());
        residual(
            &system.matrix,
            system.rhs.as_slice(),
            x0.as_slice(),
            scratch.as_mut_slice(),
        );
        let best_residual = norm(scratch.as_slice()) / b_norm;
        Self {
            b_norm,
            tolerance,
            iterations: 0,
            best: x0.clone(),
            best_residual,
            scratch,
        }
    }

    fn converged(&self) -> bool {
        self.best_residual <= self.tolerance
    }

    /// Record the iterate `x`; returns `true` once it meets the tolerance.
    fn record(&mut self, system: &LinearSystem, x: &DVector<f64>) -> bool {
        self.iterations += 1;
        residual(
            &system.matrix,
            system.rhs.as_slice(),
            x.as_slice(),
            self.scratch.as_mut_slice(),
        );
        let rel = norm(self.scratch.as_slice()) / self.b_norm;
        if rel < self.best_residual || !self.best_residual.is_finite() {
            self.best.copy_from(x);
            self.best_residual = rel;
        }
        rel <= self.tolerance
    }
}

/// Solve `system` with the method, preconditioner, tolerance and iteration
/// cap from `config`, starting from `initial_guess` (zeros when absent).
pub fn solve(
    system: &LinearSystem,
    config: &SolverConfig,
    initial_guess: Option<&DVector<f64>>,
) -> SolveOutcome {
    let n = system.matrix.n();
    let b_norm = norm(system.rhs.as_slice());
    if b_norm == 0.0 {
        return SolveOutcome {
            solution: DVector::zeros(n),
            iterations: 0,
            relative_residual: 0.0,
            converged: true,
        };
    }

    let mut x = match initial_guess {
        Some(g) if g.len() == n => g.clone(),
        Some(g) => {
            warn!(
                "initial guess has {} entries, system has {n}; starting from zero",
                g.len()
            );
            DVector::zeros(n)
        }
        None => DVector::zeros(n),
    };

    let mut tracker = Iteration::new(system, &x, b_norm, config.tolerance);
    if !tracker.converged() {
        let precond = Preconditioned::new(config.preconditioner, system);
        match config.method {
            SolverMethod::ConjugateGradient => cg::conjugate_gradient(
                system,
                &precond,
                &mut x,
                config.max_iterations,
                &mut tracker,
            ),
            SolverMethod::BiCgStab => bicgstab::bicgstab(
                system,
                &precond,
                &mut x,
                config.max_iterations,
                &mut tracker,
            ),
        }
    }

    let converged = tracker.converged();
    debug!(
        "solve ({:?}): {} iterations, relative residual {:.3e}, converged = {converged}",
        config.method, tracker.iterations, tracker.best_residual
    );
    SolveOutcome {
        solution: tracker.best,
        iterations: tracker.iterations,
        relative_residual: tracker.best_residual,
        converged,
    }
}
