//! Rate functions of the methylation fraction `x = i / M`.
//!
//! Every variant implements the same four-function contract ([`RateModel`]);
//! the event catalog, the generator matrix and the extinction solvers only see
//! the trait, so variants compose by reference instead of by inheritance.
//!
//! - linear: `r_b`, `r_d` interpolate between their `0` and `M` values
//! - threshold: `r_b`, `r_d` jump from the `0` value to the `M` value once `x > c`
//! - collaborative: linear `r_b`, `r_d`;
//!   `r_um(x) = r_um + r_um_m x^k`, `r_mu(x) = r_mu + r_mu_u (1 - x)^k`
//! - super-collaborative: collaborative with `k = 2`

use std::fmt::Debug;
use std::sync::Arc;

use crate::domain::{ModelParams, RateModelKind};
use crate::error::{ModelError, ModelResult};

/// Per-cell event rates as functions of the methylation fraction `x ∈ [0, 1]`.
///
/// `methylation` and `demethylation` are per-site rates; the per-cell event
/// rate multiplies them by the number of eligible sites.
pub trait RateModel: Debug + Send + Sync {
    fn birth(&self, x: f64) -> f64;
    fn death(&self, x: f64) -> f64;
    fn methylation(&self, x: f64) -> f64;
    fn demethylation(&self, x: f64) -> f64;
}

fn lerp(at_zero: f64, at_one: f64, x: f64) -> f64 {
    at_zero * (1.0 - x) + at_one * x
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearRates {
    pub b_0: f64,
    pub b_m: f64,
    pub d_0: f64,
    pub d_m: f64,
    pub r_um: f64,
    pub r_mu: f64,
}

impl LinearRates {
    pub fn from_params(params: &ModelParams) -> Self {
        Self {
            b_0: params.b_0,
            b_m: params.b_m,
            d_0: params.d_0,
            d_m: params.d_m,
            r_um: params.r_um,
            r_mu: params.r_mu,
        }
    }
}

impl RateModel for LinearRates {
    fn birth(&self, x: f64) -> f64 {
        lerp(self.b_0, self.b_m, x)
    }

    fn death(&self, x: f64) -> f64 {
        lerp(self.d_0, self.d_m, x)
    }

    fn methylation(&self, _x: f64) -> f64 {
        self.r_um
    }

    fn demethylation(&self, _x: f64) -> f64 {
        self.r_mu
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRates {
    pub base: LinearRates,
    /// Cutoff fraction; the `M` values apply strictly above it.
    pub cutoff: f64,
}

impl RateModel for ThresholdRates {
    fn birth(&self, x: f64) -> f64 {
        if x > self.cutoff { self.base.b_m } else { self.base.b_0 }
    }

    fn death(&self, x: f64) -> f64 {
        if x > self.cutoff { self.base.d_m } else { self.base.d_0 }
    }

    fn methylation(&self, x: f64) -> f64 {
        self.base.methylation(x)
    }

    fn demethylation(&self, x: f64) -> f64 {
        self.base.demethylation(x)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollaborativeRates {
    pub base: LinearRates,
    pub r_um_m: f64,
    pub r_mu_u: f64,
    pub degree: f64,
}

impl RateModel for CollaborativeRates {
    fn birth(&self, x: f64) -> f64 {
        self.base.birth(x)
    }

    fn death(&self, x: f64) -> f64 {
        self.base.death(x)
    }

    fn methylation(&self, x: f64) -> f64 {
        self.base.r_um + self.r_um_m * x.powf(self.degree)
    }

    fn demethylation(&self, x: f64) -> f64 {
        self.base.r_mu + self.r_mu_u * (1.0 - x).powf(self.degree)
    }
}

/// Build the rate functions named by `kind` from a parameter record.
///
/// Checks the fields the variant reads; site count and retention are checked
/// by [`crate::models::MethylationModel`].
pub fn rate_model_from_params(kind: RateModelKind, params: &ModelParams) -> ModelResult<Arc<dyn RateModel>> {
    let base = LinearRates::from_params(params);
    for (name, value) in [
        ("b_0", base.b_0),
        ("b_M", base.b_m),
        ("d_0", base.d_0),
        ("d_M", base.d_m),
        ("r_um", base.r_um),
        ("r_mu", base.r_mu),
    ] {
        require_rate(name, value)?;
    }

    let model: Arc<dyn RateModel> = match kind {
        RateModelKind::Linear => Arc::new(base),
        RateModelKind::Threshold => {
            let cutoff = params
                .c
                .ok_or_else(|| ModelError::config("threshold model requires the cutoff `c`"))?;
            if !(cutoff.is_finite() && (0.0..=1.0).contains(&cutoff)) {
                return Err(ModelError::config(format!("cutoff c must lie in [0, 1], got {cutoff}")));
            }
            Arc::new(ThresholdRates { base, cutoff })
        }
        RateModelKind::Collaborative | RateModelKind::SuperCollaborative => {
            let r_um_m = params
                .r_um_m
                .ok_or_else(|| ModelError::config("collaborative model requires `r_um_m`"))?;
            let r_mu_u = params
                .r_mu_u
                .ok_or_else(|| ModelError::config("collaborative model requires `r_mu_u`"))?;
            require_rate("r_um_m", r_um_m)?;
            require_rate("r_mu_u", r_mu_u)?;
            let degree = match kind {
                RateModelKind::SuperCollaborative => 2.0,
                _ => params.degree.unwrap_or(1.0),
            };
            if !(degree.is_finite() && degree >= 0.0) {
                return Err(ModelError::config(format!("degree must be finite and >= 0, got {degree}")));
            }
            Arc::new(CollaborativeRates {
                base,
                r_um_m,
                r_mu_u,
                degree,
            })
        }
    };
    Ok(model)
}

fn require_rate(name: &str, value: f64) -> ModelResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::config(format!("rate {name} must be finite and >= 0, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ModelParams {
        ModelParams {
            b_0: 0.8,
            b_m: 2.8,
            d_0: 2.0,
            d_m: 1.0,
            r_um: 0.2,
            r_mu: 0.1,
            p: 1.0,
            sites: 10,
            r_um_m: Some(1.0),
            r_mu_u: Some(3.0),
            degree: Some(3.0),
            c: Some(0.5),
        }
    }

    #[test]
    fn linear_interpolates_boundaries() {
        let rates = rate_model_from_params(RateModelKind::Linear, &params()).unwrap();
        assert_eq!(rates.birth(0.0), 0.8);
        assert!((rates.birth(1.0) - 2.8).abs() < 1e-12);
        assert!((rates.birth(0.5) - 1.8).abs() < 1e-12);
        assert!((rates.death(0.25) - 1.75).abs() < 1e-12);
        assert_eq!(rates.methylation(0.9), 0.2);
        assert_eq!(rates.demethylation(0.1), 0.1);
    }

    #[test]
    fn threshold_switches_strictly_above_cutoff() {
        let rates = rate_model_from_params(RateModelKind::Threshold, &params()).unwrap();
        assert_eq!(rates.birth(0.5), 0.8);
        assert_eq!(rates.birth(0.51), 2.8);
        assert_eq!(rates.death(0.0), 2.0);
        assert_eq!(rates.death(1.0), 1.0);
    }

    #[test]
    fn collaborative_uses_configured_degree() {
        let rates = rate_model_from_params(RateModelKind::Collaborative, &params()).unwrap();
        assert!((rates.methylation(0.5) - (0.2 + 0.125)).abs() < 1e-12);
        assert!((rates.demethylation(0.5) - (0.1 + 3.0 * 0.125)).abs() < 1e-12);
    }

    #[test]
    fn super_collaborative_fixes_degree_two() {
        let rates = rate_model_from_params(RateModelKind::SuperCollaborative, &params()).unwrap();
        assert!((rates.methylation(0.5) - (0.2 + 0.25)).abs() < 1e-12);
        assert!((rates.demethylation(0.0) - 3.1).abs() < 1e-12);
    }

    #[test]
    fn collaborative_degree_defaults_to_one() {
        let mut p = params();
        p.degree = None;
        let rates = rate_model_from_params(RateModelKind::Collaborative, &p).unwrap();
        assert!((rates.methylation(0.5) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn rejects_negative_or_missing_fields() {
        let mut p = params();
        p.d_m = -1.0;
        assert!(matches!(
            rate_model_from_params(RateModelKind::Linear, &p),
            Err(ModelError::Configuration(_))
        ));

        let mut p = params();
        p.c = None;
        assert!(rate_model_from_params(RateModelKind::Threshold, &p).is_err());

        let mut p = params();
        p.c = Some(1.5);
        assert!(rate_model_from_params(RateModelKind::Threshold, &p).is_err());

        let mut p = params();
        p.r_mu_u = None;
        assert!(rate_model_from_params(RateModelKind::SuperCollaborative, &p).is_err());

        let mut p = params();
        p.r_um = f64::NAN;
        assert!(rate_model_from_params(RateModelKind::Linear, &p).is_err());
    }
}
