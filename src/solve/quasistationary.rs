//! Quasistationary (long-run normalized) population shape.
//!
//! Power iteration on the unit propagator `U = exp(T)`:
//!
//! ```text
//! g_{k+1} = g_k U / |g_k U|_1
//! ```
//!
//! `U` has nonnegative entries, so the iteration converges to the left Perron
//! vector of `T`. The growth rate is `ln |g U|_1` at the fixed point.

use log::{debug, warn};

use crate::domain::QuasistationaryDistribution;
use crate::error::{ModelError, ModelResult};
use crate::math::max_abs;
use crate::solve::propagator::DeterministicPropagator;

/// Settings for [`calculate_quasistationary`].
#[derive(Debug, Clone)]
pub struct QuasistationaryOptions {
    /// Stop when successive iterates differ by less than this (sup norm).
    pub tol: f64,
    pub max_iter: usize,
    /// Starting shape; uniform when `None`.
    pub initial: Option<Vec<f64>>,
}

impl Default for QuasistationaryOptions {
    fn default() -> Self {
        Self {
            tol: 1e-12,
            max_iter: 2000,
            initial: None,
        }
    }
}

fn normalize(v: &[f64]) -> ModelResult<(Vec<f64>, f64)> {
    let mass: f64 = v.iter().sum();
    if !(mass.is_finite() && mass > 0.0) {
        return Err(ModelError::domain(format!("population mass {mass} cannot be normalized")));
    }
    Ok((v.iter().map(|x| x / mass).collect(), mass))
}

pub fn calculate_quasistationary(
    prop: &DeterministicPropagator,
    opts: &QuasistationaryOptions,
) -> ModelResult<QuasistationaryDistribution> {
    if !(opts.tol > 0.0) || opts.max_iter == 0 {
        return Err(ModelError::config("quasistationary tolerance and iteration cap must be positive"));
    }
    let states = prop.state_count();
    let start = match &opts.initial {
        Some(v) if v.len() != states => {
            return Err(ModelError::DimensionMismatch {
                expected: states,
                found: v.len(),
            });
        }
        Some(v) => v.clone(),
        None => vec![1.0; states],
    };
    let (mut dist, _) = normalize(&start)?;

    let unit = prop.operator(1.0);
    let mut residual = f64::INFINITY;

    for iteration in 1..=opts.max_iter {
        let (next, _) = normalize(&DeterministicPropagator::apply(&unit, &dist))?;
        let diff: Vec<f64> = next.iter().zip(&dist).map(|(a, b)| a - b).collect();
        residual = max_abs(&diff);
        dist = next;

        if residual < opts.tol {
            let (_, mass) = normalize(&DeterministicPropagator::apply(&unit, &dist))?;
            let growth_rate = mass.ln();
            debug!("quasistationary converged after {iteration} iterations, growth {growth_rate:.6e}");
            return Ok(QuasistationaryDistribution {
                distribution: dist,
                growth_rate,
                iterations: iteration,
                residual,
            });
        }
    }

    warn!("quasistationary power iteration stopped at the cap (residual {residual:.3e})");
    Err(ModelError::NonConvergence {
        solver: "quasistationary power iteration",
        iterations: opts.max_iter,
        residual,
        last: dist,
    })
}
