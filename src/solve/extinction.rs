//! Extinction probabilities of single-cell lineages (discrete state space).
//!
//! Conditioning on the first event of a lineage founded in state `i`:
//!
//! ```text
//! x_i = Φ(x)_i = [ u_i x_{i+1} + m_i x_{i-1} + b_i s_i(x)^2 + d_i ] / total_i
//! s_i(x) = Σ_{j <= i} C(i, j) p^j (1 - p)^(i - j) x_j
//! ```
//!
//! where `u_i`, `m_i` are the per-cell methylation/demethylation rates and
//! `s_i` is the extinction probability of one daughter. The extinction vector
//! is the minimal fixed point of `Φ` in `[0, 1]^(M+1)`.
//!
//! `Φ` is monotone and convex, and `x ≡ 1` solves it on every state with
//! events, so
//! Newton needs a start below the minimal root. A few rounds of `Φ` from
//! `x = 0` climb towards it from below. Damped Newton on `F(x) = Φ(x) - x`
//! then polishes from there. Iterates that start below the minimal root and
//! satisfy `x <= Φ(x)` keep both properties along Newton steps, so the polish
//! cannot jump to `x ≡ 1` for a supercritical lineage.

use log::debug;
use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::domain::{ExtinctionSolution, ModelParams, RateModelKind};
use crate::error::{ModelError, ModelResult};
use crate::math::{NewtonOptions, kernel_row, max_abs, newton_system};
use crate::models::{MethylationModel, StateRates};

/// Entries this far outside `[0, 1]` are snapped to the boundary; anything
/// further out is rejected.
const DOMAIN_SLACK: f64 = 1e-9;

/// Warm-up stops early once one round of `Φ` moves no entry by more than this.
const WARMUP_TOL: f64 = 1e-3;

/// Settings for [`calculate_extinction_rates`].
#[derive(Debug, Clone)]
pub struct ExtinctionOptions {
    pub newton: NewtonOptions,
    /// Rounds of `x <- Φ(x)` from zero before Newton takes over.
    pub warmup_iterations: usize,
}

impl Default for ExtinctionOptions {
    fn default() -> Self {
        Self {
            newton: NewtonOptions::default(),
            warmup_iterations: 50,
        }
    }
}

struct Recursion {
    rates: Vec<StateRates>,
    kernels: Vec<Vec<f64>>,
}

impl Recursion {
    fn new(model: &MethylationModel) -> Self {
        let p = model.retention();
        Self {
            rates: (0..model.state_count()).map(|i| model.state_rates(i)).collect(),
            kernels: (0..model.state_count()).map(|i| kernel_row(i, p)).collect(),
        }
    }

    fn len(&self) -> usize {
        self.rates.len()
    }

    fn daughter(&self, i: usize, x: &[f64]) -> f64 {
        self.kernels[i].iter().zip(x).map(|(k, xj)| k * xj).sum()
    }

    fn map(&self, x: &[f64]) -> Vec<f64> {
        let last = self.len() - 1;
        (0..self.len())
            .map(|i| {
                let r = &self.rates[i];
                let total = r.total();
                if total == 0.0 {
                    return 0.0;
                }
                let s = self.daughter(i, x);
                let mut acc = r.birth * s * s + r.death;
                if i < last {
                    acc += r.methylation * x[i + 1];
                }
                if i > 0 {
                    acc += r.demethylation * x[i - 1];
                }
                acc / total
            })
            .collect()
    }

    /// `(F(x), J(x))` for `F = Φ - x`.
    fn system(&self, x: &[f64]) -> (Vec<f64>, DMatrix<f64>) {
        let n = self.len();
        let phi = self.map(x);
        let f: Vec<f64> = phi.iter().zip(x).map(|(p, xi)| p - xi).collect();
        let mut jac = DMatrix::<f64>::zeros(n, n);

        for i in 0..n {
            jac[(i, i)] -= 1.0;
            let r = &self.rates[i];
            let total = r.total();
            if total == 0.0 {
                continue;
            }
            let s = self.daughter(i, x);
            for (j, k) in self.kernels[i].iter().enumerate() {
                jac[(i, j)] += 2.0 * r.birth * s * k / total;
            }
            if i + 1 < n {
                jac[(i, i + 1)] += r.methylation / total;
            }
            if i > 0 {
                jac[(i, i - 1)] += r.demethylation / total;
            }
        }
        (f, jac)
    }

    /// `Φ^k(0)` for up to `rounds` rounds; a lower bound on the minimal fixed point.
    fn warm_start(&self, rounds: usize) -> (Vec<f64>, usize) {
        let mut x = vec![0.0; self.len()];
        for round in 0..rounds {
            let next = self.map(&x);
            let change = next.iter().zip(&x).map(|(a, b)| a - b).fold(0.0, f64::max);
            x = next;
            if change < WARMUP_TOL {
                return (x, round + 1);
            }
        }
        (x, rounds)
    }
}

/// One application of the extinction recursion `Φ`.
pub fn extinction_map(model: &MethylationModel, x: &[f64]) -> ModelResult<Vec<f64>> {
    model.check_len(x.len())?;
    Ok(Recursion::new(model).map(x))
}

/// Solve `x = Φ(x)` for the per-state extinction probabilities.
pub fn calculate_extinction_rates(model: &MethylationModel, opts: &ExtinctionOptions) -> ModelResult<ExtinctionSolution> {
    let recursion = Recursion::new(model);
    let (x0, warmup) = recursion.warm_start(opts.warmup_iterations);

    let outcome = newton_system(|x| recursion.system(x), &x0, &opts.newton);
    if !outcome.converged {
        return Err(ModelError::NonConvergence {
            solver: "extinction Newton",
            iterations: outcome.iterations,
            residual: outcome.residual,
            last: outcome.x,
        });
    }

    let mut probabilities = outcome.x;
    for (i, x) in probabilities.iter_mut().enumerate() {
        if !x.is_finite() || *x < -DOMAIN_SLACK || *x > 1.0 + DOMAIN_SLACK {
            return Err(ModelError::domain(format!(
                "extinction probability of state {i} is {x}, outside [0, 1]"
            )));
        }
        // Every fixed point lies above the warm start.
        if *x < x0[i] - DOMAIN_SLACK {
            return Err(ModelError::domain(format!(
                "extinction probability of state {i} fell to {x}, below the lower bound {}",
                x0[i]
            )));
        }
        *x = x.clamp(0.0, 1.0);
    }

    let phi = recursion.map(&probabilities);
    let diff: Vec<f64> = phi.iter().zip(&probabilities).map(|(a, b)| a - b).collect();
    let residual = max_abs(&diff);
    debug!(
        "extinction solved for M = {} after {warmup} warm-up rounds and {} Newton steps (residual {residual:.3e})",
        model.sites(),
        outcome.iterations
    );

    Ok(ExtinctionSolution {
        probabilities,
        residual,
        iterations: outcome.iterations,
    })
}

/// Discrete extinction vectors for the same rates at several site counts.
pub fn extinction_by_site_count(
    kind: RateModelKind,
    params: &ModelParams,
    site_counts: &[usize],
    opts: &ExtinctionOptions,
) -> ModelResult<Vec<(usize, ExtinctionSolution)>> {
    site_counts
        .par_iter()
        .map(|&sites| {
            let model = MethylationModel::from_params(kind, &params.with_sites(sites))?;
            Ok((sites, calculate_extinction_rates(&model, opts)?))
        })
        .collect()
}
