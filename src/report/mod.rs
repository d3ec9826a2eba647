//! Reporting utilities: Monte Carlo residuals against the analytic solution,
//! and formatted terminal output.

use serde::Serialize;

use crate::domain::{ExtinctionEstimate, ExtinctionSolution};
use crate::error::{AppError, ModelError};

pub mod format;

pub use format::*;

/// One state of the extinction comparison table.
#[derive(Debug, Clone, Serialize)]
pub struct ExtinctionRow {
    pub state: usize,
    pub fraction: f64,
    pub analytic: f64,
    pub monte_carlo: Option<f64>,
    pub standard_error: Option<f64>,
    /// `monte_carlo - analytic` in standard errors.
    pub z_score: Option<f64>,
    pub retained: Option<usize>,
    pub discarded: Option<usize>,
}

/// Pair the analytic vector with an optional Monte Carlo estimate, state by state.
pub fn compare_extinction(
    solution: &ExtinctionSolution,
    estimate: Option<&ExtinctionEstimate>,
) -> Result<Vec<ExtinctionRow>, AppError> {
    let states = solution.probabilities.len();
    if let Some(est) = estimate {
        if est.estimates.len() != states {
            return Err(ModelError::DimensionMismatch {
                expected: states,
                found: est.estimates.len(),
            }
            .into());
        }
    }
    let sites = states.saturating_sub(1).max(1);
    let errors = estimate.map(ExtinctionEstimate::standard_errors);

    let rows = (0..states)
        .map(|i| {
            let analytic = solution.probabilities[i];
            let monte_carlo = estimate.map(|e| e.estimates[i]);
            let standard_error = errors.as_ref().map(|se| se[i]);
            let z_score = match (monte_carlo, standard_error) {
                (Some(mc), Some(se)) if se > 0.0 => Some((mc - analytic) / se),
                _ => None,
            };
            ExtinctionRow {
                state: i,
                fraction: i as f64 / sites as f64,
                analytic,
                monte_carlo,
                standard_error,
                z_score,
                retained: estimate.map(|e| e.retained[i]),
                discarded: estimate.map(|e| e.discarded[i]),
            }
        })
        .collect();
    Ok(rows)
}
