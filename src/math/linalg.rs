//! Dense linear-algebra helpers on top of nalgebra.
//!
//! The solvers need two primitives:
//! - solve a small square system `A x = b` (Newton steps)
//! - find the null direction of a (numerically) singular matrix (left
//!   eigenvectors of the generator)
//!
//! LU is tried first; when the system is nearly singular we fall back to SVD
//! with progressively looser tolerances.

use nalgebra::{DMatrix, DVector};

/// Solve a square system `a * x = b`.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_square(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if let Some(x) = a.clone().lu().solve(b) {
        if x.iter().all(|v| v.is_finite()) {
            return Some(x);
        }
    }

    let svd = a.clone().svd(true, true);
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(x) = svd.solve(b, tol) {
            if x.iter().all(|v| v.is_finite()) {
                return Some(x);
            }
        }
    }

    None
}

/// Right singular vector of `a` belonging to its smallest singular value.
///
/// For a matrix with a one-dimensional null space this spans that space. The
/// returned vector is unit-length with arbitrary sign.
pub fn null_vector(a: &DMatrix<f64>) -> Option<DVector<f64>> {
    let svd = a.clone().svd(false, true);
    let v_t = svd.v_t.as_ref()?;
    let (idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|x, y| x.1.total_cmp(y.1))?;
    Some(v_t.row(idx).transpose())
}

/// Infinity norm of a slice; `NaN` if any entry is `NaN`.
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, v| {
        if acc.is_nan() || v.is_nan() { f64::NAN } else { acc.max(v.abs()) }
    })
}
