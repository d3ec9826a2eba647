//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - loaded from a JSON parameter file
//! - used in-memory by the simulators and solvers
//! - exported to JSON/CSV for external plotting

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which rate-function family drives the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RateModelKind {
    /// Birth and death interpolate linearly between their boundary values.
    Linear,
    /// Birth and death switch from the `0` value to the `M` value above the cutoff `c`.
    Threshold,
    /// Linear birth/death; methylation and demethylation gain a `x^degree` term.
    Collaborative,
    /// Collaborative with the degree fixed at 2.
    SuperCollaborative,
}

impl RateModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            RateModelKind::Linear => "linear",
            RateModelKind::Threshold => "threshold",
            RateModelKind::Collaborative => "collaborative",
            RateModelKind::SuperCollaborative => "super-collaborative",
        }
    }
}

/// Parameter record supplied by callers.
///
/// Field names follow the conventional notation (`b_0`, `b_M`, `r_um`, ...) so
/// parameter files read like the model equations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Birth rate of a fully unmethylated cell.
    pub b_0: f64,
    /// Birth rate of a fully methylated cell.
    #[serde(rename = "b_M")]
    pub b_m: f64,
    /// Death rate of a fully unmethylated cell.
    pub d_0: f64,
    /// Death rate of a fully methylated cell.
    #[serde(rename = "d_M")]
    pub d_m: f64,
    /// Per-site methylation rate.
    pub r_um: f64,
    /// Per-site demethylation rate.
    pub r_mu: f64,
    /// Probability that a daughter keeps each methylated site.
    pub p: f64,
    /// Number of methylation sites.
    #[serde(rename = "M")]
    pub sites: usize,

    /// Collaborative methylation amplitude (rate added at full methylation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_um_m: Option<f64>,
    /// Collaborative demethylation amplitude (rate added at zero methylation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_mu_u: Option<f64>,
    /// Exponent of the collaborative terms (defaults to 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<f64>,
    /// Cutoff fraction of the threshold variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<f64>,
}

impl ModelParams {
    /// Constant-rate record (`b_0 = b_M`, no collaborative terms).
    pub fn uniform(sites: usize, birth: f64, d_0: f64, d_m: f64, r_um: f64, r_mu: f64, p: f64) -> Self {
        Self {
            b_0: birth,
            b_m: birth,
            d_0,
            d_m,
            r_um,
            r_mu,
            p,
            sites,
            r_um_m: None,
            r_mu_u: None,
            degree: None,
            c: None,
        }
    }

    /// Same record with a different site count.
    pub fn with_sites(&self, sites: usize) -> Self {
        Self {
            sites,
            ..self.clone()
        }
    }

    /// Same record with every methylation and demethylation rate multiplied
    /// by `scale`; their ratio, and so the flux-balance point, is unchanged.
    pub fn with_methylation_scale(&self, scale: f64) -> Self {
        Self {
            r_um: self.r_um * scale,
            r_mu: self.r_mu * scale,
            r_um_m: self.r_um_m.map(|r| r * scale),
            r_mu_u: self.r_mu_u.map(|r| r * scale),
            ..self.clone()
        }
    }
}

/// A single state transition with its precomputed per-cell rate.
///
/// `origin` is the methylation state of the cell the event acts on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Event {
    Birth { origin: usize, rate: f64 },
    Death { origin: usize, rate: f64 },
    /// Only valid for `origin < M`.
    Methylation { origin: usize, rate: f64 },
    /// Only valid for `origin > 0`.
    Demethylation { origin: usize, rate: f64 },
}

impl Event {
    pub fn origin(&self) -> usize {
        match *self {
            Event::Birth { origin, .. }
            | Event::Death { origin, .. }
            | Event::Methylation { origin, .. }
            | Event::Demethylation { origin, .. } => origin,
        }
    }

    pub fn rate(&self) -> f64 {
        match *self {
            Event::Birth { rate, .. }
            | Event::Death { rate, .. }
            | Event::Methylation { rate, .. }
            | Event::Demethylation { rate, .. } => rate,
        }
    }

    /// Net change in total cell count when this event fires.
    pub fn population_delta(&self) -> i64 {
        match self {
            Event::Birth { .. } => 1,
            Event::Death { .. } => -1,
            Event::Methylation { .. } | Event::Demethylation { .. } => 0,
        }
    }
}

/// Population counts over a time grid.
///
/// `populations[k]` is the population vector at `timepoints[k]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    pub timepoints: Vec<f64>,
    pub populations: Vec<Vec<f64>>,
}

impl Trajectory {
    /// Total population at each timepoint.
    pub fn totals(&self) -> Vec<f64> {
        self.populations.iter().map(|row| row.iter().sum()).collect()
    }
}

/// Solution of the discrete extinction recursion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtinctionSolution {
    /// `probabilities[i]`: extinction probability of a lineage founded by one cell in state `i`.
    pub probabilities: Vec<f64>,
    /// `max_i |Φ(x)_i - x_i|` at the returned point.
    pub residual: f64,
    pub iterations: usize,
}

/// Long-run normalized population shape and its growth rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuasistationaryDistribution {
    pub distribution: Vec<f64>,
    /// Natural-log multiplier of total mass per unit time.
    pub growth_rate: f64,
    pub iterations: usize,
    pub residual: f64,
}

/// Continuum-limit extinction curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitCurve {
    /// Fraction where methylation and demethylation flux balance.
    pub critical_fraction: f64,
    /// Extinction probability imposed at `critical_fraction`.
    pub critical_probability: f64,
    /// `(fraction, probability)` pairs on a uniform grid over `[0, 1]`.
    pub points: Vec<(f64, f64)>,
}

impl LimitCurve {
    pub fn probabilities(&self) -> Vec<f64> {
        self.points.iter().map(|&(_, y)| y).collect()
    }
}

/// Monte Carlo extinction estimate per starting state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtinctionEstimate {
    /// Fraction of retained runs that went extinct; `NaN` if no run was retained.
    pub estimates: Vec<f64>,
    /// Runs that finished within the step budget.
    pub retained: Vec<usize>,
    /// Runs that exceeded the step budget and were excluded.
    pub discarded: Vec<usize>,
}

impl ExtinctionEstimate {
    /// Standard error of each estimate, `sqrt(p(1-p)/n)`.
    pub fn standard_errors(&self) -> Vec<f64> {
        self.estimates
            .iter()
            .zip(&self.retained)
            .map(|(&p, &n)| {
                if n == 0 {
                    f64::NAN
                } else {
                    (p * (1.0 - p) / n as f64).sqrt()
                }
            })
            .collect()
    }
}
