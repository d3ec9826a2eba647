//! Root finders.
//!
//! - [`bisect`]: bracketed scalar root (used to locate the flux-balance point
//!   of the continuum model; the bracket `[0, 1]` always has a sign change
//!   there, so bisection is both sufficient and unconditionally stable).
//! - [`newton_system`]: damped Newton iteration for `F(x) = 0` in `R^n` with an
//!   analytic Jacobian.

use nalgebra::{DMatrix, DVector};

use crate::math::linalg::{max_abs, solve_square};

/// Find a root of `f` on `[lo, hi]` by bisection.
///
/// Returns `None` when `f(lo)` and `f(hi)` have the same strict sign or are
/// not finite.
pub fn bisect<F: Fn(f64) -> f64>(f: F, mut lo: f64, mut hi: f64, tol: f64, max_iter: usize) -> Option<f64> {
    let mut f_lo = f(lo);
    let f_hi = f(hi);
    if !(f_lo.is_finite() && f_hi.is_finite()) {
        return None;
    }
    if f_lo == 0.0 {
        return Some(lo);
    }
    if f_hi == 0.0 {
        return Some(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return None;
    }

    for _ in 0..max_iter {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid == 0.0 || (hi - lo) < tol {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

/// Armijo constant of the line search.
const SUFFICIENT_DECREASE: f64 = 1e-4;

fn norm2(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Settings for [`newton_system`].
#[derive(Debug, Clone, Copy)]
pub struct NewtonOptions {
    /// Stop when `max |F(x)| < tol`.
    pub tol: f64,
    pub max_iter: usize,
    /// Smallest step fraction tried by the backtracking line search.
    pub min_step: f64,
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self {
            tol: 1e-12,
            max_iter: 100,
            min_step: 1.0 / 1024.0,
        }
    }
}

/// Final state of a Newton run.
#[derive(Debug, Clone)]
pub struct NewtonOutcome {
    pub x: Vec<f64>,
    /// `max |F(x)|` at `x`.
    pub residual: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Solve `F(x) = 0` by damped Newton iteration.
///
/// `system(x)` returns `(F(x), J(x))`. A step of length `t` along the Newton
/// direction is accepted once `|F|_2` drops by at least `1e-4 * t` relative;
/// `t` is halved from 1 down to `opts.min_step`, after which the iteration
/// stops unconverged. A singular Jacobian also stops the iteration.
/// Convergence is judged on `max |F|`.
pub fn newton_system<S>(system: S, x0: &[f64], opts: &NewtonOptions) -> NewtonOutcome
where
    S: Fn(&[f64]) -> (Vec<f64>, DMatrix<f64>),
{
    let mut x = x0.to_vec();
    let (mut f, mut jac) = system(&x);
    let mut residual = max_abs(&f);

    for iteration in 0..opts.max_iter {
        if residual < opts.tol {
            return NewtonOutcome {
                x,
                residual,
                iterations: iteration,
                converged: true,
            };
        }

        let rhs = DVector::from_iterator(f.len(), f.iter().map(|v| -v));
        let Some(delta) = solve_square(&jac, &rhs) else {
            return NewtonOutcome {
                x,
                residual,
                iterations: iteration,
                converged: false,
            };
        };

        let norm = norm2(&f);
        let mut step = 1.0;
        let accepted = loop {
            let trial: Vec<f64> = x.iter().zip(delta.iter()).map(|(xi, di)| xi + step * di).collect();
            let (f_trial, jac_trial) = system(&trial);
            let r_trial = max_abs(&f_trial);
            if r_trial.is_finite() && norm2(&f_trial) <= (1.0 - SUFFICIENT_DECREASE * step) * norm {
                break Some((trial, f_trial, jac_trial, r_trial));
            }
            step *= 0.5;
            if step < opts.min_step {
                break None;
            }
        };

        match accepted {
            Some((trial, f_trial, jac_trial, r_trial)) => {
                x = trial;
                f = f_trial;
                jac = jac_trial;
                residual = r_trial;
            }
            None => {
                return NewtonOutcome {
                    x,
                    residual,
                    iterations: iteration + 1,
                    converged: false,
                };
            }
        }
    }

    NewtonOutcome {
        converged: residual < opts.tol,
        x,
        residual,
        iterations: opts.max_iter,
    }
}
