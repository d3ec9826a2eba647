//! Deterministic (mean-field) propagation of expected counts.
//!
//! The flow matrix `T` is the mean matrix generator of the multitype branching
//! process: expected counts obey `dn/dt = n T` (row vector), hence
//!
//! ```text
//! n(t) = n(0) · exp(T t)
//! ```
//!
//! Entries (`x = i / M`):
//! - `T[i][i+1] += (M - i) r_um(x)`, `T[i][i-1] += i r_mu(x)`
//! - `T[i][j] += 2 C(i, j) p^j (1 - p)^(i - j) r_b(x)` for `j <= i` (two daughters)
//! - `T[i][i] -= r_b + r_d + (M - i) r_um + i r_mu` (everything leaving state `i`)
//!
//! Row `i` of `T` sums to `r_b - r_d`, the net per-capita growth of state `i`.
//! Subtracting that diagonal leaves the conservative generator `G`, whose rows
//! sum to zero.
//!
//! The legacy eigen path (`dominant_eigen`) reads the growth rate and stable
//! shape straight off the spectrum of `T`. It is kept to cross-check the power
//! iteration in `solve::quasistationary`; for large `M` the Schur decomposition
//! of a stiff `T` loses accuracy and the power iteration is authoritative.

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::error::{ModelError, ModelResult};
use crate::math::{kernel, null_vector};
use crate::models::MethylationModel;

/// Growth rate and left Perron vector of `T`.
#[derive(Debug, Clone)]
pub struct EigenSummary {
    pub growth_rate: f64,
    /// Left eigenvector normalized to unit sum.
    pub distribution: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct DeterministicPropagator {
    flow: DMatrix<f64>,
    /// `r_b - r_d` per state (the row sums of `flow`).
    net_growth: Vec<f64>,
}

impl DeterministicPropagator {
    pub fn new(model: &MethylationModel) -> Self {
        let sites = model.sites();
        let states = model.state_count();
        let p = model.retention();
        let mut flow = DMatrix::<f64>::zeros(states, states);
        let mut net_growth = Vec::with_capacity(states);

        for i in 0..states {
            let r = model.state_rates(i);
            if i < sites {
                flow[(i, i + 1)] += r.methylation;
            }
            if i > 0 {
                flow[(i, i - 1)] += r.demethylation;
            }
            for j in 0..=i {
                flow[(i, j)] += 2.0 * kernel(i, j, p) * r.birth;
            }
            flow[(i, i)] -= r.total();
            net_growth.push(r.birth - r.death);
        }

        Self { flow, net_growth }
    }

    /// The flow matrix `T`.
    pub fn flow_matrix(&self) -> &DMatrix<f64> {
        &self.flow
    }

    /// Conservative generator `G = T - diag(r_b - r_d)`; rows sum to zero.
    pub fn generator(&self) -> DMatrix<f64> {
        let mut g = self.flow.clone();
        for (i, growth) in self.net_growth.iter().enumerate() {
            g[(i, i)] -= growth;
        }
        g
    }

    pub fn net_growth(&self) -> &[f64] {
        &self.net_growth
    }

    pub fn state_count(&self) -> usize {
        self.flow.nrows()
    }

    /// Transition operator `exp(T t)`.
    pub fn operator(&self, t: f64) -> DMatrix<f64> {
        (&self.flow * t).exp()
    }

    /// Row-vector product `n · op`.
    pub fn apply(op: &DMatrix<f64>, n: &[f64]) -> Vec<f64> {
        let column = DVector::from_column_slice(n);
        op.tr_mul(&column).iter().copied().collect()
    }

    /// Expected counts after time `t`: `n(0) · exp(T t)`.
    pub fn run_det(&self, n_initial: &[f64], t: f64) -> ModelResult<Vec<f64>> {
        if n_initial.len() != self.state_count() {
            return Err(ModelError::DimensionMismatch {
                expected: self.state_count(),
                found: n_initial.len(),
            });
        }
        if !t.is_finite() {
            return Err(ModelError::config(format!("propagation time must be finite, got {t}")));
        }
        let out = Self::apply(&self.operator(t), n_initial);
        if out.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::domain(format!("non-finite counts after propagating for t = {t}")));
        }
        Ok(out)
    }

    /// Dominant eigenvalue of `T` and its left eigenvector (legacy path).
    pub fn dominant_eigen(&self) -> ModelResult<EigenSummary> {
        let n = self.state_count();
        let growth_rate = self
            .flow
            .complex_eigenvalues()
            .iter()
            .map(|z| z.re)
            .fold(f64::NEG_INFINITY, f64::max);
        if !growth_rate.is_finite() {
            return Err(ModelError::domain("flow matrix has no finite eigenvalue"));
        }

        let shifted = self.flow.transpose() - DMatrix::<f64>::identity(n, n) * growth_rate;
        let v = null_vector(&shifted).ok_or_else(|| ModelError::domain("left eigenvector SVD failed"))?;
        let total = v.sum();
        if !(total.is_finite() && total.abs() > 1e-300) {
            return Err(ModelError::domain("left eigenvector has zero mass"));
        }
        let distribution: Vec<f64> = v.iter().map(|x| x / total).collect();
        debug!("dominant eigenvalue {growth_rate:.6e}");

        Ok(EigenSummary {
            growth_rate,
            distribution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelParams, RateModelKind};

    fn propagator(kind: RateModelKind, params: &ModelParams) -> DeterministicPropagator {
        DeterministicPropagator::new(&MethylationModel::from_params(kind, params).unwrap())
    }

    fn all_variants() -> Vec<(RateModelKind, ModelParams)> {
        let mut base = ModelParams::uniform(6, 1.8, 3.0, 1.0, 0.2, 0.1, 0.7);
        base.b_0 = 0.8;
        base.r_um_m = Some(1.5);
        base.r_mu_u = Some(0.5);
        base.degree = Some(3.0);
        base.c = Some(0.4);
        vec![
            (RateModelKind::Linear, base.clone()),
            (RateModelKind::Threshold, base.clone()),
            (RateModelKind::Collaborative, base.clone()),
            (RateModelKind::SuperCollaborative, base.with_sites(12)),
        ]
    }

    #[test]
    fn generator_rows_sum_to_zero() {
        for (kind, params) in all_variants() {
            let prop = propagator(kind, &params);
            let g = prop.generator();
            for i in 0..g.nrows() {
                let s: f64 = g.row(i).iter().sum();
                assert!(s.abs() < 1e-9, "{kind:?} row {i} sums to {s}");
            }
        }
    }

    #[test]
    fn flow_rows_sum_to_net_growth() {
        for (kind, params) in all_variants() {
            let prop = propagator(kind, &params);
            let model = MethylationModel::from_params(kind, &params).unwrap();
            for i in 0..prop.state_count() {
                let s: f64 = prop.flow_matrix().row(i).iter().sum();
                let r = model.state_rates(i);
                assert!((s - (r.birth - r.death)).abs() < 1e-9, "{kind:?} row {i}");
                assert!((s - prop.net_growth()[i]).abs() < 1e-9, "{kind:?} row {i}");
            }
        }
    }

    #[test]
    fn off_diagonal_entries_are_nonnegative() {
        for (kind, params) in all_variants() {
            let t = propagator(kind, &params).flow_matrix().clone();
            for i in 0..t.nrows() {
                for j in 0..t.ncols() {
                    if i != j {
                        assert!(t[(i, j)] >= 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn closed_states_grow_exponentially() {
        // No methylation flux and p = 1: every state only feeds itself.
        let (b, d, t) = (1.7, 0.6, 1.3);
        let prop = propagator(RateModelKind::Linear, &ModelParams::uniform(1, b, d, d, 0.0, 0.0, 1.0));
        let out = prop.run_det(&[1.0, 0.0], t).unwrap();
        assert!((out[0] - ((b - d) * t).exp()).abs() < 1e-10, "got {out:?}");
        assert!(out[1].abs() < 1e-12);
    }

    #[test]
    fn pure_death_decays_elementwise() {
        let d = 0.8;
        let prop = propagator(RateModelKind::Linear, &ModelParams::uniform(3, 0.0, d, d, 0.0, 0.0, 0.5));
        let n = [3.0, 1.0, 0.0, 7.5];
        let t = 2.5;
        let out = prop.run_det(&n, t).unwrap();
        for (a, b) in out.iter().zip(n) {
            assert!((a - b * (-d * t).exp()).abs() < 1e-12);
        }
    }

    #[test]
    fn run_det_is_linear() {
        let prop = propagator(RateModelKind::Linear, &ModelParams::uniform(4, 2.2, 3.0, 1.0, 0.2, 0.2, 0.8));
        let n1 = [1.0, 0.0, 2.0, 0.5, 0.0];
        let n2 = [0.0, 3.0, 0.0, 1.0, 4.0];
        let (a, b) = (2.5, -0.75);
        let mixed: Vec<f64> = n1.iter().zip(n2).map(|(x, y)| a * x + b * y).collect();
        let lhs = prop.run_det(&mixed, 0.7).unwrap();
        let r1 = prop.run_det(&n1, 0.7).unwrap();
        let r2 = prop.run_det(&n2, 0.7).unwrap();
        for k in 0..5 {
            let rhs = a * r1[k] + b * r2[k];
            assert!((lhs[k] - rhs).abs() < 1e-9 * (1.0 + rhs.abs()));
        }
    }

    #[test]
    fn zero_time_is_identity() {
        let prop = propagator(RateModelKind::Linear, &ModelParams::uniform(2, 1.0, 1.0, 2.0, 0.3, 0.3, 0.5));
        let out = prop.run_det(&[1.0, 2.0, 3.0], 0.0).unwrap();
        for (a, b) in out.iter().zip([1.0, 2.0, 3.0]) {
            assert!((a - b).abs() < 1e-14);
        }
    }

    #[test]
    fn dominant_eigen_of_closed_states() {
        // Closed states: T is diagonal with entries b - d(x); the fastest state wins.
        let prop = propagator(RateModelKind::Linear, &ModelParams::uniform(2, 2.0, 3.0, 1.0, 0.0, 0.0, 1.0));
        let eig = prop.dominant_eigen().unwrap();
        assert!((eig.growth_rate - 1.0).abs() < 1e-10);
        assert!((eig.distribution[2] - 1.0).abs() < 1e-10);
        assert!(eig.distribution[0].abs() < 1e-10);
    }

    #[test]
    fn rejects_wrong_length() {
        let prop = propagator(RateModelKind::Linear, &ModelParams::uniform(2, 1.0, 1.0, 1.0, 0.1, 0.1, 1.0));
        assert!(matches!(
            prop.run_det(&[1.0], 1.0),
            Err(ModelError::DimensionMismatch { expected: 3, found: 1 })
        ));
    }
}
