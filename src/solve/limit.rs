//! Continuum-limit (`M → ∞`) extinction curve.
//!
//! With the methylation fraction `x` as a continuous variable, the extinction
//! probability `y(x)` obeys
//!
//! ```text
//! dy/dx = (r_b y - r_d)(y - 1) / D(x),   D(x) = r_mu x - r_um (1 - x)
//! ```
//!
//! `D` vanishes at the flux-balance point `x*`, where regularity forces
//! `y(x*) = min(r_d / r_b, 1)`. The curve is built by two initial-value
//! integrations outward from `(x*, y*)`: down to `0` and up to `1`.
//!
//! Notes:
//! - `x*` comes from bisection on `D` over `[0, 1]`; without a sign change the
//!   curve is undefined.
//! - At `x*` itself the right-hand side is `0 / 0`; the first step uses the
//!   l'Hôpital slope `(r_d - r_b) / (r_um + r_mu)` (or 0 on the `y = 1` branch).

use log::debug;
use rayon::prelude::*;

use crate::domain::{LimitCurve, ModelParams, RateModelKind};
use crate::error::{ModelError, ModelResult};
use crate::math::{bisect, integrate_on_grid};
use crate::models::{RateModel, rate_model_from_params};

/// Output values may overshoot `[0, 1]` by this much from integration error.
const RANGE_SLACK: f64 = 1e-6;

/// Settings for [`calculate_limit_extinction_rates`].
#[derive(Debug, Clone)]
pub struct LimitOptions {
    /// RK4 steps per grid interval.
    pub substeps: usize,
    /// `|D(x)|` below this is treated as the singular point.
    pub singular_tol: f64,
}

impl Default for LimitOptions {
    fn default() -> Self {
        Self {
            substeps: 16,
            singular_tol: 1e-12,
        }
    }
}

fn flux_balance(rates: &dyn RateModel, x: f64) -> f64 {
    rates.demethylation(x) * x - rates.methylation(x) * (1.0 - x)
}

/// Extinction curve sampled at `x = k / point_count`, `k = 0..=point_count`.
pub fn calculate_limit_extinction_rates(
    rates: &dyn RateModel,
    point_count: usize,
    opts: &LimitOptions,
) -> ModelResult<LimitCurve> {
    if point_count == 0 {
        return Err(ModelError::config("limit curve needs at least one grid interval"));
    }

    if flux_balance(rates, 0.0) == 0.0 && flux_balance(rates, 1.0) == 0.0 {
        return Err(ModelError::domain("no methylation flux at either boundary"));
    }
    let critical_fraction = bisect(|x| flux_balance(rates, x), 0.0, 1.0, 1e-15, 200)
        .ok_or_else(|| ModelError::domain("methylation flux does not change sign on [0, 1]"))?;
    let (b_star, d_star) = (rates.birth(critical_fraction), rates.death(critical_fraction));
    let critical_probability = if b_star > 0.0 { (d_star / b_star).min(1.0) } else { 1.0 };
    debug!("continuum limit: x* = {critical_fraction:.6}, y* = {critical_probability:.6}");

    let slope = |x: f64, y: f64| {
        let denom = flux_balance(rates, x);
        let (b, d) = (rates.birth(x), rates.death(x));
        if denom.abs() < opts.singular_tol {
            if y == 1.0 {
                0.0
            } else {
                (d - b) / (rates.methylation(x) + rates.demethylation(x))
            }
        } else {
            (b * y - d) * (y - 1.0) / denom
        }
    };

    let grid: Vec<f64> = (0..=point_count).map(|k| k as f64 / point_count as f64).collect();
    let split = grid.partition_point(|&x| x < critical_fraction);

    let mut lower_grid = vec![critical_fraction];
    lower_grid.extend(grid[..split].iter().rev());
    let mut upper_grid = vec![critical_fraction];
    upper_grid.extend(&grid[split..]);

    let lower = integrate_on_grid(slope, &lower_grid, critical_probability, opts.substeps);
    let upper = integrate_on_grid(slope, &upper_grid, critical_probability, opts.substeps);

    let values = lower[1..].iter().rev().chain(&upper[1..]);
    let points: Vec<(f64, f64)> = grid.iter().copied().zip(values.copied()).collect();

    for &(x, y) in &points {
        if !y.is_finite() || y < -RANGE_SLACK || y > 1.0 + RANGE_SLACK {
            return Err(ModelError::domain(format!("continuum extinction curve reached {y} at x = {x}")));
        }
    }

    Ok(LimitCurve {
        critical_fraction,
        critical_probability,
        points,
    })
}

/// One continuum curve per methylation speed-up factor.
///
/// Each scale multiplies all methylation and demethylation rates; birth and
/// death stay put, so larger scales wash out the fitness differences between
/// fractions.
pub fn limit_extinction_by_methylation_scale(
    kind: RateModelKind,
    params: &ModelParams,
    scales: &[f64],
    point_count: usize,
    opts: &LimitOptions,
) -> ModelResult<Vec<(f64, LimitCurve)>> {
    if let Some(bad) = scales.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
        return Err(ModelError::config(format!("methylation scale must be positive, got {bad}")));
    }
    scales
        .par_iter()
        .map(|&scale| {
            let rates = rate_model_from_params(kind, &params.with_methylation_scale(scale))?;
            Ok((scale, calculate_limit_extinction_rates(rates.as_ref(), point_count, opts)?))
        })
        .collect()
}
