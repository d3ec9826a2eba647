//! A validated model instance: rate functions plus site count and retention.
//!
//! The simulators and solvers rely on one primitive, the per-cell rates of a
//! cell in state `i` ([`StateRates`]). Everything state-indexed is derived from
//! it here so the catalog, generator and extinction recursion cannot disagree
//! about how site counts scale the per-site rates.

use std::sync::Arc;

use crate::domain::{ModelParams, RateModelKind};
use crate::error::{ModelError, ModelResult};
use crate::models::rates::{RateModel, rate_model_from_params};

/// Per-cell event rates of a cell with `i` methylated sites.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateRates {
    pub birth: f64,
    pub death: f64,
    /// `(M - i) · r_um(i / M)`
    pub methylation: f64,
    /// `i · r_mu(i / M)`
    pub demethylation: f64,
}

impl StateRates {
    pub fn total(&self) -> f64 {
        self.birth + self.death + self.methylation + self.demethylation
    }
}

/// Immutable model instance. Cheap to clone; rate functions are shared.
#[derive(Debug, Clone)]
pub struct MethylationModel {
    sites: usize,
    retention: f64,
    rates: Arc<dyn RateModel>,
}

impl MethylationModel {
    /// Wrap rate functions with a site count `M >= 1` and retention `p ∈ [0, 1]`.
    ///
    /// Every state's rates are evaluated once and must be finite and `>= 0`.
    pub fn new(sites: usize, retention: f64, rates: Arc<dyn RateModel>) -> ModelResult<Self> {
        if sites < 1 {
            return Err(ModelError::config("site count M must be >= 1"));
        }
        if !(retention.is_finite() && (0.0..=1.0).contains(&retention)) {
            return Err(ModelError::config(format!(
                "retention probability p must lie in [0, 1], got {retention}"
            )));
        }

        let model = Self {
            sites,
            retention,
            rates,
        };
        for i in 0..=sites {
            let r = model.state_rates(i);
            let values = [r.birth, r.death, r.methylation, r.demethylation];
            if values.iter().any(|v| !(v.is_finite() && *v >= 0.0)) {
                return Err(ModelError::config(format!(
                    "rates of state {i} must be finite and >= 0, got {r:?}"
                )));
            }
        }
        Ok(model)
    }

    /// Build from a parameter record and rate family.
    pub fn from_params(kind: RateModelKind, params: &ModelParams) -> ModelResult<Self> {
        let rates = rate_model_from_params(kind, params)?;
        Self::new(params.sites, params.p, rates)
    }

    /// `M`.
    pub fn sites(&self) -> usize {
        self.sites
    }

    /// `M + 1`, the length of every population vector.
    pub fn state_count(&self) -> usize {
        self.sites + 1
    }

    /// Daughter retention probability `p`.
    pub fn retention(&self) -> f64 {
        self.retention
    }

    pub fn rates(&self) -> &dyn RateModel {
        self.rates.as_ref()
    }

    /// Methylation fraction of state `i`.
    pub fn fraction(&self, state: usize) -> f64 {
        state as f64 / self.sites as f64
    }

    pub fn state_rates(&self, state: usize) -> StateRates {
        let x = self.fraction(state);
        let unmethylated = (self.sites - state) as f64;
        let methylated = state as f64;
        StateRates {
            birth: self.rates.birth(x),
            death: self.rates.death(x),
            methylation: if state < self.sites {
                unmethylated * self.rates.methylation(x)
            } else {
                0.0
            },
            demethylation: if state > 0 {
                methylated * self.rates.demethylation(x)
            } else {
                0.0
            },
        }
    }

    /// Check a population vector has `M + 1` entries.
    pub fn check_len(&self, len: usize) -> ModelResult<()> {
        if len == self.state_count() {
            Ok(())
        } else {
            Err(ModelError::DimensionMismatch {
                expected: self.state_count(),
                found: len,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ModelParams {
        ModelParams::uniform(4, 2.2, 3.0, 1.0, 0.2, 0.3, 1.0)
    }

    #[test]
    fn state_rates_scale_with_eligible_sites() {
        let model = MethylationModel::from_params(RateModelKind::Linear, &params()).unwrap();
        let r0 = model.state_rates(0);
        assert!((r0.methylation - 0.8).abs() < 1e-12);
        assert_eq!(r0.demethylation, 0.0);
        assert_eq!(r0.death, 3.0);

        let r4 = model.state_rates(4);
        assert_eq!(r4.methylation, 0.0);
        assert!((r4.demethylation - 1.2).abs() < 1e-12);
        assert_eq!(r4.death, 1.0);

        let r1 = model.state_rates(1);
        assert!((r1.total() - (2.2 + 2.5 + 0.6 + 0.3)).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_sites_and_retention() {
        assert!(matches!(
            MethylationModel::from_params(RateModelKind::Linear, &params().with_sites(0)),
            Err(ModelError::Configuration(_))
        ));

        let mut p = params();
        p.p = 1.2;
        assert!(MethylationModel::from_params(RateModelKind::Linear, &p).is_err());
        p.p = -0.1;
        assert!(MethylationModel::from_params(RateModelKind::Linear, &p).is_err());
    }

    #[test]
    fn checks_population_length() {
        let model = MethylationModel::from_params(RateModelKind::Linear, &params()).unwrap();
        assert!(model.check_len(5).is_ok());
        assert!(matches!(
            model.check_len(4),
            Err(ModelError::DimensionMismatch { expected: 5, found: 4 })
        ));
    }
}
