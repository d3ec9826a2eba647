//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the solvers and simulators stay free of presentation concerns
//! - output changes are localized

use crate::domain::{ExtinctionSolution, LimitCurve, ModelParams, QuasistationaryDistribution, RateModelKind, Trajectory};
use crate::report::ExtinctionRow;
use crate::solve::EigenSummary;

/// Header block naming the rate family and its parameters.
pub fn format_model_header(kind: RateModelKind, params: &ModelParams) -> String {
    let mut out = String::new();
    out.push_str("=== methyl - methylation population dynamics ===\n");
    out.push_str(&format!("Model: {} | M={} | p={}\n", kind.display_name(), params.sites, params.p));
    out.push_str(&format!(
        "Birth: b_0={} b_M={} | Death: d_0={} d_M={}\n",
        params.b_0, params.b_m, params.d_0, params.d_m
    ));
    out.push_str(&format!("Methylation: r_um={} r_mu={}", params.r_um, params.r_mu));
    if let (Some(up), Some(down)) = (params.r_um_m, params.r_mu_u) {
        out.push_str(&format!(
            " | collaborative: r_um_m={up} r_mu_u={down} degree={}",
            params.degree.unwrap_or(1.0)
        ));
    }
    if let Some(c) = params.c {
        out.push_str(&format!(" | cutoff c={c}"));
    }
    out.push('\n');
    out
}

pub fn format_extinction_table(rows: &[ExtinctionRow], solution: &ExtinctionSolution) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Extinction probabilities (Newton: {} steps, residual {:.2e})\n",
        solution.iterations, solution.residual
    ));

    let with_mc = rows.iter().any(|r| r.monte_carlo.is_some());
    if with_mc {
        out.push_str(&format!(
            "{:>6} {:>8} {:>12} {:>12} {:>10} {:>8} {:>10}\n",
            "state", "x", "analytic", "monte_carlo", "std_err", "z", "discarded"
        ));
        out.push_str(&format!(
            "{:-<6} {:-<8} {:-<12} {:-<12} {:-<10} {:-<8} {:-<10}\n",
            "", "", "", "", "", "", ""
        ));
    } else {
        out.push_str(&format!("{:>6} {:>8} {:>12}\n", "state", "x", "analytic"));
        out.push_str(&format!("{:-<6} {:-<8} {:-<12}\n", "", "", ""));
    }

    for r in rows {
        let line = if with_mc {
            format!(
                "{:>6} {:>8.4} {:>12.6} {:>12} {:>10} {:>8} {:>10}",
                r.state,
                r.fraction,
                r.analytic,
                fmt_opt(r.monte_carlo, 6),
                fmt_opt(r.standard_error, 4),
                fmt_opt(r.z_score, 2),
                r.discarded.map(|d| d.to_string()).unwrap_or_default(),
            )
        } else {
            format!("{:>6} {:>8.4} {:>12.6}", r.state, r.fraction, r.analytic)
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Extinction probability per state for several site counts, one block each.
pub fn format_site_sweep(sweep: &[(usize, ExtinctionSolution)]) -> String {
    let mut out = String::new();
    for (sites, solution) in sweep {
        out.push_str(&format!("M={sites}: {}\n", fmt_vec(&solution.probabilities)));
    }
    out
}

pub fn format_scale_sweep(sweep: &[(f64, LimitCurve)]) -> String {
    let mut out = String::new();
    for (scale, curve) in sweep {
        out.push_str(&format!("x{scale}: {}\n", fmt_vec(&curve.probabilities())));
    }
    out
}

pub fn format_trajectory(traj: &Trajectory) -> String {
    let mut out = String::new();
    let totals = traj.totals();
    out.push_str(&format!("{:>10} {:>14}  counts\n", "t", "total"));
    out.push_str(&format!("{:-<10} {:-<14}  {:-<6}\n", "", "", ""));
    for ((t, row), total) in traj.timepoints.iter().zip(&traj.populations).zip(totals) {
        out.push_str(&format!("{t:>10.4} {total:>14.4}  {}\n", fmt_vec(row)));
    }
    out
}

pub fn format_limit_curve(curve: &LimitCurve) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Continuum limit: x*={:.6} y*={:.6}\n",
        curve.critical_fraction, curve.critical_probability
    ));
    out.push_str(&format!("{:>10} {:>12}\n", "x", "extinction"));
    out.push_str(&format!("{:-<10} {:-<12}\n", "", ""));
    for (x, y) in &curve.points {
        out.push_str(&format!("{x:>10.4} {y:>12.6}\n"));
    }
    out
}

/// Power-iteration result, with the eigen cross-check when available.
pub fn format_quasistationary(qsd: &QuasistationaryDistribution, eigen: Option<&EigenSummary>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Quasistationary distribution ({} iterations, residual {:.2e})\n",
        qsd.iterations, qsd.residual
    ));
    out.push_str(&format!("- growth rate: {:.8}\n", qsd.growth_rate));
    out.push_str(&format!("- shape      : {}\n", fmt_vec(&qsd.distribution)));
    if let Some(eig) = eigen {
        let gap = qsd
            .distribution
            .iter()
            .zip(&eig.distribution)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        out.push_str(&format!(
            "- eigen check: growth {:.8} (diff {:.2e}), shape diff {gap:.2e}\n",
            eig.growth_rate,
            (eig.growth_rate - qsd.growth_rate).abs()
        ));
    }
    out
}

fn fmt_opt(v: Option<f64>, digits: usize) -> String {
    match v {
        Some(x) if x.is_nan() => "n/a".to_string(),
        Some(x) => format!("{x:.digits$}"),
        None => String::new(),
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}
